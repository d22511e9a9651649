use thiserror::Error;

use crate::domain::{CoinId, SimDate};

/// Validation errors for identifiers, dates, and configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("coin id cannot be empty")]
    EmptyCoinId,
    #[error("date must be RFC3339 UTC or YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("epoch milliseconds {value} are outside the supported date range")]
    DateOutOfRange { value: i64 },
}

/// Failure of a single upstream attempt, or of the whole retry loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, timeout, or body read failure.
    #[error("upstream transport error: {0}")]
    Transport(String),

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    /// Body was not a JSON array of coins.
    #[error("upstream payload could not be decoded: {0}")]
    Decode(String),

    /// Shutdown was requested before a snapshot was obtained.
    #[error("fetch cancelled by shutdown")]
    Cancelled,

    #[error("upstream fetch gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<FetchError> },
}

impl FetchError {
    /// Whether another attempt may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status { .. } | Self::Decode(_)
        )
    }
}

/// Errors crossing the catalog's read boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("coin '{id}' not found")]
    NotFound { id: CoinId },
}

/// Errors raised while loading or releasing the initial catalog.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Warehouse(#[from] coinclock_warehouse::WarehouseError),

    #[error("stored coin at position {position} is malformed: {message}")]
    Decode { position: usize, message: String },
}

/// Invalid runtime configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {name} has invalid value '{value}': {reason}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("day duration must be greater than zero")]
    ZeroDayDuration,

    #[error("upstream base url cannot be empty")]
    EmptyUpstreamUrl,

    #[error("retry max attempts must be greater than zero")]
    ZeroMaxAttempts,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("clock cannot advance past {date}")]
    ClockOverflow { date: SimDate },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification_covers_retryable_variants() {
        assert!(FetchError::Transport(String::from("refused")).is_transient());
        assert!(FetchError::Status { status: 503 }.is_transient());
        assert!(FetchError::Decode(String::from("eof")).is_transient());
        assert!(!FetchError::Cancelled.is_transient());
        assert!(!FetchError::Exhausted {
            attempts: 3,
            last: Box::new(FetchError::Status { status: 500 }),
        }
        .is_transient());
    }

    #[test]
    fn not_found_message_names_the_coin() {
        let id = CoinId::parse("ltc").expect("valid id");
        let err = CatalogError::NotFound { id };
        assert_eq!(err.to_string(), "coin 'ltc' not found");
    }
}

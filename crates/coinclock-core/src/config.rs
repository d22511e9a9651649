//! Runtime settings for the simulation: start date, tick length, upstream.

use std::time::Duration;

use crate::retry::{Backoff, RetryPolicy};
use crate::{ConfigError, SimDate};

pub const ENV_INITIAL_DATE: &str = "COINCLOCK_INITIAL_DATE";
pub const ENV_DAY_DURATION_SECS: &str = "COINCLOCK_DAY_DURATION_SECS";
pub const ENV_UPSTREAM_URL: &str = "COINCLOCK_UPSTREAM_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "COINCLOCK_REQUEST_TIMEOUT_MS";
pub const ENV_RETRY_MAX_ATTEMPTS: &str = "COINCLOCK_RETRY_MAX_ATTEMPTS";
pub const ENV_RETRY_EXPONENTIAL: &str = "COINCLOCK_RETRY_EXPONENTIAL";
pub const ENV_RETRY_JITTER: &str = "COINCLOCK_RETRY_JITTER";

pub const DEFAULT_UPSTREAM_URL: &str = "http://localhost:8000";

/// Longest wait between attempts once backoff is exponential.
pub const MAX_EXPONENTIAL_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Simulated date fetched by the first tick.
    pub initial_date: SimDate,
    /// Real time per simulated day.
    pub day_duration: Duration,
    pub upstream_base_url: String,
    /// Per-attempt HTTP timeout.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_date: default_initial_date(),
            day_duration: Duration::from_secs(60),
            upstream_base_url: String::from(DEFAULT_UPSTREAM_URL),
            request_timeout: Duration::from_secs(3),
            retry: RetryPolicy::default(),
        }
    }
}

fn default_initial_date() -> SimDate {
    SimDate::from_ymd(2014, 1, 1).expect("2014-01-01 is a valid date")
}

impl SimulationConfig {
    /// Defaults overridden by `COINCLOCK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `COINCLOCK_*` name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::default().apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `COINCLOCK_*` values found by `lookup`, without
    /// validating the result, so later overrides (CLI flags) can still apply.
    ///
    /// Blank values count as unset; anything else must parse.
    pub fn apply_env<F>(self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .map(|value| (name, value))
        };

        let mut config = self;

        if let Some((name, value)) = read(ENV_INITIAL_DATE) {
            config.initial_date = SimDate::parse(&value).map_err(|error| ConfigError::InvalidEnv {
                name,
                value: value.clone(),
                reason: error.to_string(),
            })?;
        }

        if let Some((name, value)) = read(ENV_DAY_DURATION_SECS) {
            config.day_duration = Duration::from_secs(parse_u64(name, &value)?);
        }

        if let Some((_, value)) = read(ENV_UPSTREAM_URL) {
            config.upstream_base_url = value;
        }

        if let Some((name, value)) = read(ENV_REQUEST_TIMEOUT_MS) {
            config.request_timeout = Duration::from_millis(parse_u64(name, &value)?);
        }

        if let Some((name, value)) = read(ENV_RETRY_MAX_ATTEMPTS) {
            let attempts = u32::try_from(parse_u64(name, &value)?).map_err(|_| {
                ConfigError::InvalidEnv {
                    name,
                    value: value.clone(),
                    reason: String::from("too large"),
                }
            })?;
            if attempts == 0 {
                return Err(ConfigError::ZeroMaxAttempts);
            }
            config.retry.max_attempts = Some(attempts);
        }

        if let Some((name, value)) = read(ENV_RETRY_EXPONENTIAL) {
            if parse_flag(name, &value)? {
                config = config.with_exponential_backoff(MAX_EXPONENTIAL_DELAY);
            }
        }

        if let Some((name, value)) = read(ENV_RETRY_JITTER) {
            if parse_flag(name, &value)? {
                config = config.with_jittered_backoff();
            }
        }

        Ok(config)
    }

    /// Switch to capped exponential backoff, keeping the attempt limit and any jitter.
    pub fn with_exponential_backoff(mut self, max_delay: Duration) -> Self {
        let jitter = matches!(self.retry.backoff, Backoff::Exponential { jitter: true, .. });
        self.retry.backoff = Backoff::capped_exponential(max_delay);
        if jitter {
            self.retry.backoff = self.retry.backoff.jittered();
        }
        self
    }

    /// Jitter the exponential backoff, switching to it first if the backoff is fixed.
    pub fn with_jittered_backoff(self) -> Self {
        let mut config = match self.retry.backoff {
            Backoff::Fixed { .. } => self.with_exponential_backoff(MAX_EXPONENTIAL_DELAY),
            Backoff::Exponential { .. } => self,
        };
        config.retry.backoff = config.retry.backoff.jittered();
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.day_duration.is_zero() {
            return Err(ConfigError::ZeroDayDuration);
        }
        if self.upstream_base_url.trim().is_empty() {
            return Err(ConfigError::EmptyUpstreamUrl);
        }
        if self.retry.max_attempts == Some(0) {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        Ok(())
    }
}

fn parse_u64(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|error| ConfigError::InvalidEnv {
        name,
        value: value.to_owned(),
        reason: error.to_string(),
    })
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            name,
            value: value.to_owned(),
            reason: String::from("expected true or false"),
        }),
    }
}

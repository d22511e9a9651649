use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Upstream coin identifier (e.g. `bitcoin`, `binance-peg-dogecoin`).
///
/// Opaque apart from being non-blank: the upstream decides what an id looks
/// like, and lookups compare it byte for byte, case included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CoinId(String);

impl CoinId {
    /// Accept `input` verbatim unless it is empty or only whitespace.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Self::try_from(input.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CoinId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for CoinId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyCoinId);
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for CoinId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CoinId> for String {
    fn from(value: CoinId) -> Self {
        value.0
    }
}

impl PartialEq<str> for CoinId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

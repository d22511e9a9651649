use serde::{Deserialize, Serialize};

/// One stored coin: its identifier and the full JSON object it was published as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub id: String,
    pub payload: String,
}

impl CoinRecord {
    pub fn new(id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
        }
    }

    /// Build a record from a JSON object, taking the id from its `id` field.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let id = value.get("id")?.as_str()?;
        Some(Self::new(id, value.to_string()))
    }
}

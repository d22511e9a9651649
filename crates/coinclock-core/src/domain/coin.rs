use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::CoinId;

/// One tracked coin at a point in simulated time.
///
/// Everything except `id` is carried through untouched: the upstream's
/// price and metadata fields are flattened next to the id on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub id: CoinId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Coin {
    pub fn new(id: CoinId) -> Self {
        Self {
            id,
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

//! Startup source of the initial catalog.

use coinclock_warehouse::{CoinRecord, Warehouse};

use crate::{CatalogSnapshot, Coin, RepositoryError};

/// Supplies the catalog that seeds [`CoinCatalog`](crate::CoinCatalog) before the first tick.
pub trait CoinRepository: Send + Sync {
    /// Load the seed snapshot, in stored order.
    fn load_initial(&self) -> Result<CatalogSnapshot, RepositoryError>;

    /// Release resources held by the repository. Called once on shutdown.
    fn close(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// In-memory repository; an empty one starts the catalog empty.
#[derive(Debug, Clone, Default)]
pub struct StaticRepository {
    coins: Vec<Coin>,
}

impl StaticRepository {
    pub fn new(coins: Vec<Coin>) -> Self {
        Self { coins }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl CoinRepository for StaticRepository {
    fn load_initial(&self) -> Result<CatalogSnapshot, RepositoryError> {
        Ok(CatalogSnapshot::new(None, self.coins.clone()))
    }
}

impl CoinRepository for Warehouse {
    fn load_initial(&self) -> Result<CatalogSnapshot, RepositoryError> {
        let records = self.load_coins()?;
        let coins = records
            .iter()
            .enumerate()
            .map(|(position, record)| decode_record(position, record))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(coins = coins.len(), path = %self.db_path().display(), "loaded seed catalog");
        Ok(CatalogSnapshot::new(None, coins))
    }

    fn close(&self) -> Result<(), RepositoryError> {
        self.checkpoint()?;
        Ok(())
    }
}

fn decode_record(position: usize, record: &CoinRecord) -> Result<Coin, RepositoryError> {
    let coin: Coin =
        serde_json::from_str(&record.payload).map_err(|error| RepositoryError::Decode {
            position,
            message: error.to_string(),
        })?;

    if coin.id != *record.id.as_str() {
        return Err(RepositoryError::Decode {
            position,
            message: format!(
                "payload id '{}' does not match stored id '{}'",
                coin.id, record.id
            ),
        });
    }
    Ok(coin)
}

/// Convert coins into warehouse rows, for seeding the store.
pub fn to_records(coins: &[Coin]) -> Result<Vec<CoinRecord>, RepositoryError> {
    coins
        .iter()
        .enumerate()
        .map(|(position, coin)| {
            serde_json::to_string(coin)
                .map(|payload| CoinRecord::new(coin.id.as_str(), payload))
                .map_err(|error| RepositoryError::Decode {
                    position,
                    message: error.to_string(),
                })
        })
        .collect()
}

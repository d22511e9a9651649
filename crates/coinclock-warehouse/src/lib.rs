//! # Coinclock Warehouse
//!
//! DuckDB-backed store for the coins the catalog is seeded with at startup.
//!
//! ## Overview
//!
//! The warehouse keeps one ordered list of coins. Each row stores the coin id
//! and the complete JSON object it was published as, so whatever attributes
//! the upstream source carried survive a restart unchanged.
//!
//! ```rust,no_run
//! use coinclock_warehouse::{CoinRecord, Warehouse, WarehouseConfig};
//!
//! let warehouse = Warehouse::open(WarehouseConfig::at("coinclock.duckdb"))?;
//! warehouse.seed_coins(&[CoinRecord::new("btc", r#"{"id":"btc","price":812.4}"#)])?;
//!
//! let stored = warehouse.load_coins()?;
//! assert_eq!(stored[0].id, "btc");
//!
//! warehouse.checkpoint()?;
//! # Ok::<(), coinclock_warehouse::WarehouseError>(())
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `coins` | Seed catalog in publication order |
//! | `schema_migrations` | Applied migration versions |

pub mod duckdb;
pub mod migrations;
pub mod models;

use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::Connection;
use ::duckdb::ToSql;
use thiserror::Error;

pub use duckdb::{ConnectionPool, Lease};
pub use models::CoinRecord;

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error while preparing the database directory.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A record was rejected before it reached the database.
    #[error("invalid coin record at position {position}: {reason}")]
    InvalidRecord { position: usize, reason: String },
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept by the pool.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::at("coinclock.duckdb")
    }
}

impl WarehouseConfig {
    pub fn at(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            max_pool_size: 2,
        }
    }
}

/// The coin store.
#[derive(Clone)]
pub struct Warehouse {
    pool: ConnectionPool,
}

impl Warehouse {
    /// Open (creating if needed) the database and apply pending migrations.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let pool = ConnectionPool::open(config.db_path, config.max_pool_size)?;
        let warehouse = Self { pool };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Apply schema migrations. Idempotent.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.pool.lease()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        self.pool.db_path()
    }

    /// Stored coins in publication order.
    pub fn load_coins(&self) -> Result<Vec<CoinRecord>, WarehouseError> {
        let connection = self.pool.lease()?;
        let mut statement = connection.prepare("SELECT id, payload FROM coins ORDER BY position")?;
        let rows = statement.query_map([], |row| {
            Ok(CoinRecord {
                id: row.get(0)?,
                payload: row.get(1)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn coin_count(&self) -> Result<usize, WarehouseError> {
        let connection = self.pool.lease()?;
        let count: i64 = connection.query_row("SELECT COUNT(*) FROM coins", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Replace the stored coins with `records`, in one transaction.
    ///
    /// Every record needs a non-empty id and a payload that is a JSON object;
    /// nothing is written if any record fails that check.
    pub fn seed_coins(&self, records: &[CoinRecord]) -> Result<(), WarehouseError> {
        for (position, record) in records.iter().enumerate() {
            validate_record(position, record)?;
        }

        let connection = self.pool.lease()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), WarehouseError> {
            connection.execute("DELETE FROM coins", [])?;
            for (position, record) in records.iter().enumerate() {
                let position = i64::try_from(position).unwrap_or(i64::MAX);
                let params: [&dyn ToSql; 3] = [&position, &record.id, &record.payload];
                connection.execute(
                    "INSERT INTO coins (position, id, payload, updated_at) \
                     VALUES (?, ?, ?, CURRENT_TIMESTAMP)",
                    params.as_slice(),
                )?;
            }
            Ok(())
        })();

        finalize_transaction(&connection, result)?;
        tracing::debug!(coins = records.len(), path = %self.db_path().display(), "seeded coin store");
        Ok(())
    }

    /// Flush the write-ahead log into the database file.
    pub fn checkpoint(&self) -> Result<(), WarehouseError> {
        let connection = self.pool.lease()?;
        connection.execute_batch("CHECKPOINT")?;
        tracing::debug!(path = %self.db_path().display(), "checkpointed coin store");
        Ok(())
    }
}

fn validate_record(position: usize, record: &CoinRecord) -> Result<(), WarehouseError> {
    if record.id.trim().is_empty() {
        return Err(WarehouseError::InvalidRecord {
            position,
            reason: String::from("id is empty"),
        });
    }

    match serde_json::from_str::<serde_json::Value>(&record.payload) {
        Ok(serde_json::Value::Object(_)) => Ok(()),
        Ok(_) => Err(WarehouseError::InvalidRecord {
            position,
            reason: String::from("payload is not a JSON object"),
        }),
        Err(error) => Err(WarehouseError::InvalidRecord {
            position,
            reason: format!("payload is not valid JSON: {error}"),
        }),
    }
}

/// Commit on success, roll back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

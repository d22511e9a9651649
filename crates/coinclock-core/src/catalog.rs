//! The published coin catalog.
//!
//! A [`CoinCatalog`] holds one immutable [`CatalogSnapshot`] behind an `Arc`.
//! `replace` swaps the `Arc` under a write lock held only for the swap, and
//! `lookup` clones the `Arc` under a read lock and scans outside it, so a
//! reader always works against exactly one snapshot and never waits on a fetch.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::{CatalogError, Coin, CoinId, SimDate};

/// Ordered coins produced by one fetch cycle (or the startup seed).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogSnapshot {
    /// Simulated date the coins were fetched for; `None` for the repository seed.
    pub as_of: Option<SimDate>,
    pub coins: Vec<Coin>,
}

impl CatalogSnapshot {
    pub fn new(as_of: Option<SimDate>, coins: Vec<Coin>) -> Self {
        Self { as_of, coins }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// First coin with the given id, in snapshot order.
    pub fn find(&self, id: &str) -> Option<&Coin> {
        self.coins.iter().find(|coin| coin.id == *id)
    }

    /// Ids that occur more than once, each reported once, in first-repeat order.
    pub fn duplicate_ids(&self) -> Vec<CoinId> {
        let mut seen = HashSet::with_capacity(self.coins.len());
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();
        for coin in &self.coins {
            if !seen.insert(coin.id.as_str()) && reported.insert(coin.id.as_str()) {
                duplicates.push(coin.id.clone());
            }
        }
        duplicates
    }
}

/// Shared, atomically replaced view of the current snapshot.
#[derive(Debug)]
pub struct CoinCatalog {
    current: RwLock<Arc<CatalogSnapshot>>,
    generation: AtomicU64,
}

impl Default for CoinCatalog {
    fn default() -> Self {
        Self::new(CatalogSnapshot::empty())
    }
}

impl CoinCatalog {
    pub fn new(initial: CatalogSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            generation: AtomicU64::new(0),
        }
    }

    /// Install `snapshot` as current. Readers see the old or the new one, never a mix.
    pub fn replace(&self, snapshot: CatalogSnapshot) {
        let duplicates = snapshot.duplicate_ids();
        if !duplicates.is_empty() {
            tracing::warn!(
                count = duplicates.len(),
                first = %duplicates[0],
                "snapshot contains duplicate coin ids; lookups return the first occurrence"
            );
        }

        let next = Arc::new(snapshot);
        // Poisoning cannot leave a torn value: the guarded data is a single Arc.
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let previous = std::mem::replace(&mut *guard, next);
        self.generation.fetch_add(1, Ordering::AcqRel);
        drop(guard);
        drop(previous);
    }

    /// The current snapshot reference.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// First coin in the current snapshot whose id equals `id`.
    pub fn lookup(&self, id: &CoinId) -> Result<Coin, CatalogError> {
        let snapshot = self.snapshot();
        match snapshot.find(id.as_str()) {
            Some(coin) => Ok(coin.clone()),
            None => {
                tracing::debug!(coin = %id, "catalog lookup miss");
                Err(CatalogError::NotFound { id: id.clone() })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Number of `replace` calls since construction.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coin(id: &str, price: f64) -> Coin {
        Coin::new(CoinId::parse(id).expect("valid id")).with_attribute("price", json!(price))
    }

    fn id(value: &str) -> CoinId {
        CoinId::parse(value).expect("valid id")
    }

    #[test]
    fn empty_catalog_misses_every_lookup() {
        let catalog = CoinCatalog::default();

        assert!(catalog.is_empty());
        assert_eq!(catalog.generation(), 0);
        assert_eq!(
            catalog.lookup(&id("btc")),
            Err(CatalogError::NotFound { id: id("btc") })
        );
    }

    #[test]
    fn lookup_returns_the_exact_coin() {
        let btc = coin("btc", 812.0);
        let catalog = CoinCatalog::new(CatalogSnapshot::new(None, vec![btc.clone(), coin("eth", 9.1)]));

        assert_eq!(catalog.lookup(&id("btc")), Ok(btc));
        assert!(catalog.lookup(&id("ltc")).is_err());
    }

    #[test]
    fn replace_swaps_the_whole_snapshot() {
        let catalog = CoinCatalog::new(CatalogSnapshot::new(None, vec![coin("btc", 1.0)]));
        let before = catalog.snapshot();

        let day = SimDate::from_ymd(2014, 1, 2).expect("valid");
        catalog.replace(CatalogSnapshot::new(Some(day), vec![coin("eth", 2.0)]));

        assert_eq!(catalog.generation(), 1);
        assert!(catalog.lookup(&id("btc")).is_err());
        assert!(catalog.lookup(&id("eth")).is_ok());
        assert_eq!(catalog.snapshot().as_of, Some(day));
        // A reference taken earlier still sees the old snapshot in full.
        assert_eq!(before.len(), 1);
        assert!(before.find("btc").is_some());
    }

    #[test]
    fn duplicate_ids_resolve_to_the_first_occurrence() {
        let snapshot = CatalogSnapshot::new(
            None,
            vec![coin("btc", 1.0), coin("eth", 2.0), coin("btc", 3.0), coin("btc", 4.0)],
        );
        assert_eq!(snapshot.duplicate_ids(), vec![id("btc")]);

        let catalog = CoinCatalog::new(CatalogSnapshot::empty());
        catalog.replace(snapshot);
        let found = catalog.lookup(&id("btc")).expect("present");
        assert_eq!(found.attribute("price"), Some(&json!(1.0)));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let catalog = CoinCatalog::new(CatalogSnapshot::new(None, vec![coin("btc", 1.0)]));
        assert!(catalog.lookup(&id("BTC")).is_err());
    }
}

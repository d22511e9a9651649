//! Shared state handed to every handler.
//!
//! Handlers only read: the catalog through [`CoinCatalog::snapshot`] and
//! [`CoinCatalog::lookup`], the clock through a [`ClockReader`]. The refresh
//! daemon keeps the only writer handles.

use std::sync::Arc;

use coinclock_core::{ClockReader, CoinCatalog};

#[derive(Debug, Clone)]
pub struct AppState {
    pub catalog: Arc<CoinCatalog>,
    pub clock: ClockReader,
}

impl AppState {
    pub fn new(catalog: Arc<CoinCatalog>, clock: ClockReader) -> Self {
        Self { catalog, clock }
    }
}

//! # Coinclock Core
//!
//! Simulated-time coin catalog: a virtual clock that advances one day per
//! tick, a retrying upstream fetcher, and the catalog the daemon publishes
//! into while request handlers read from it.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`catalog`] | Atomically replaced coin snapshot with point lookups |
//! | [`clock`] | Single-writer virtual clock and its read handles |
//! | [`config`] | Simulation settings from defaults and `COINCLOCK_*` variables |
//! | [`daemon`] | The fetch, publish, advance, wait loop |
//! | [`domain`] | Domain models (CoinId, Coin, SimDate) |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`repository`] | Startup seed catalog (in-memory or warehouse) |
//! | [`retry`] | Fixed and capped exponential retry policies |
//! | [`shutdown`] | Cooperative shutdown signal |
//! | [`upstream`] | Upstream source and retrying fetcher |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use coinclock_core::{
//!     shutdown, CoinCatalog, HttpUpstream, RefreshDaemon, ReqwestHttpClient, SimulationConfig,
//!     UpstreamFetcher, VirtualClock,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SimulationConfig::from_env()?;
//!     let upstream = HttpUpstream::new(&config.upstream_base_url, Arc::new(ReqwestHttpClient::new()))
//!         .with_timeout(config.request_timeout);
//!
//!     let catalog = Arc::new(CoinCatalog::default());
//!     let daemon = RefreshDaemon::new(
//!         UpstreamFetcher::new(Arc::new(upstream), config.retry.clone()),
//!         Arc::clone(&catalog),
//!         VirtualClock::new(config.initial_date, config.day_duration),
//!     );
//!
//!     let (trigger, listener) = shutdown::channel();
//!     let handle = daemon.spawn(listener);
//!
//!     tokio::signal::ctrl_c().await?;
//!     trigger.trigger();
//!     let report = handle.await?;
//!     println!("published {} snapshots", report.ticks);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐  now/advance  ┌──────────────────┐
//! │  RefreshDaemon  │──────────────▶│  VirtualClock    │◀── ClockReader (handlers)
//! └────────┬────────┘               └──────────────────┘
//!          │ fetch(date)
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ UpstreamFetcher │────▶│ UpstreamSource   │──▶ HttpClient (reqwest)
//! │ (retry/cancel)  │     │ (one attempt)    │
//! └────────┬────────┘     └──────────────────┘
//!          │ replace(snapshot)
//!          ▼
//! ┌─────────────────┐
//! │  CoinCatalog    │◀── lookup(id) (handlers)
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Fetch failures stay inside the daemon; the only error a reader sees is
//! [`CatalogError::NotFound`]:
//!
//! ```rust
//! use coinclock_core::{CatalogError, CoinCatalog, CoinId};
//!
//! let catalog = CoinCatalog::default();
//! let id = CoinId::parse("btc").unwrap();
//! assert!(matches!(catalog.lookup(&id), Err(CatalogError::NotFound { .. })));
//! ```

pub mod catalog;
pub mod clock;
pub mod config;
pub mod daemon;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod repository;
pub mod retry;
pub mod shutdown;
pub mod upstream;

// Catalog
pub use catalog::{CatalogSnapshot, CoinCatalog};

// Clock
pub use clock::{ClockReader, VirtualClock};

// Configuration
pub use config::SimulationConfig;

// Daemon
pub use daemon::{DaemonReport, RefreshDaemon, TickOutcome};

// Domain models
pub use domain::{Coin, CoinId, SimDate};

// Error types
pub use error::{
    CatalogError, ConfigError, CoreError, FetchError, RepositoryError, ValidationError,
};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Seed repository
pub use repository::{CoinRepository, StaticRepository};

// Retry logic
pub use retry::{Backoff, RetryPolicy};

// Shutdown signal
pub use shutdown::{Shutdown, ShutdownTrigger};

// Upstream
pub use upstream::{HttpUpstream, UpstreamFetcher, UpstreamSource};

// Warehouse (re-exported from coinclock-warehouse)
pub use coinclock_warehouse::{CoinRecord, Warehouse, WarehouseConfig, WarehouseError};

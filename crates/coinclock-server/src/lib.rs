//! HTTP surface and process lifecycle for coinclock.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐          ┌────────────────────────┐
//! │  RefreshDaemon task     │          │  Axum server           │
//! │                         │          │                        │
//! │  fetch(now)             │          │  GET /coins/:id        │
//! │  catalog.replace() ─────┼─ Arc ───>│  catalog.lookup()      │
//! │  clock.advance()  ──────┼─ reader >│  clock.now()           │
//! │  sleep(day)             │          │                        │
//! └─────────────────────────┘          └────────────────────────┘
//!              ▲                                   ▲
//!              └──────── shutdown (watch) ─────────┘
//! ```
//!
//! # Lifecycle
//!
//! [`run`] opens the coin store, seeds the catalog, starts the daemon and
//! serves until the shutdown signal fires. Then the daemon stops, in-flight
//! requests drain, and the store is checkpointed.
//!
//! # Modules
//!
//! - [`app`]: router and middleware
//! - [`cli`]: command-line flags
//! - [`error`]: HTTP and process errors
//! - [`logging`]: tracing subscriber setup
//! - [`routes`]: handlers
//! - [`state`]: shared handler state

pub mod app;
pub mod cli;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

use std::future::Future;
use std::sync::Arc;

use coinclock_core::{
    shutdown, CoinCatalog, CoinRepository, DaemonReport, HttpClient, HttpUpstream,
    RefreshDaemon, ReqwestHttpClient, UpstreamFetcher, VirtualClock,
};
use coinclock_warehouse::{Warehouse, WarehouseConfig};
use tokio::net::TcpListener;

pub use app::create_app;
pub use cli::{Cli, LogFormat};
pub use error::{AppError, AppResult, ServerError};
pub use state::AppState;

/// Run the server with the production HTTP client and the DuckDB store at `cli.db_path`.
pub async fn run<F>(cli: &Cli, listener: TcpListener, signal: F) -> Result<DaemonReport, ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let warehouse = Warehouse::open(WarehouseConfig::at(&cli.db_path))?;
    run_with(
        cli,
        listener,
        Arc::new(warehouse),
        Arc::new(ReqwestHttpClient::new()),
        signal,
    )
    .await
}

/// Run the server against the given repository and upstream HTTP client.
///
/// Returns once `signal` resolves (or the server fails) and every
/// collaborator has shut down.
pub async fn run_with<F>(
    cli: &Cli,
    listener: TcpListener,
    repository: Arc<dyn CoinRepository>,
    http_client: Arc<dyn HttpClient>,
    signal: F,
) -> Result<DaemonReport, ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let config = cli.simulation_config()?;
    let addr = listener.local_addr()?;
    let seed = repository.load_initial()?;
    let catalog = Arc::new(CoinCatalog::new(seed));

    let upstream = HttpUpstream::new(config.upstream_base_url.clone(), http_client)
        .with_timeout(config.request_timeout);
    let clock = VirtualClock::new(config.initial_date, config.day_duration);
    let state = AppState::new(Arc::clone(&catalog), clock.reader());
    let daemon = RefreshDaemon::new(
        UpstreamFetcher::new(Arc::new(upstream), config.retry.clone()),
        catalog,
        clock,
    );

    let (trigger, daemon_shutdown) = shutdown::channel();
    let mut server_shutdown = trigger.subscribe();
    let daemon_handle = daemon.spawn(daemon_shutdown);

    // Aborting this task drops the trigger, which also stops the daemon.
    let signal_task = tokio::spawn(async move {
        signal.await;
        tracing::info!("shutdown requested");
        trigger.trigger();
    });

    tracing::info!(
        %addr,
        upstream = %config.upstream_base_url,
        start = %config.initial_date,
        "coinclock listening"
    );
    let served = axum::serve(listener, create_app(state))
        .with_graceful_shutdown(async move { server_shutdown.triggered().await })
        .await;
    signal_task.abort();

    let joined = daemon_handle.await;
    // The store is closed whatever happened to the daemon or the server.
    let closed = repository.close();
    let report = joined.map_err(|error| ServerError::Daemon(error.to_string()))?;
    closed?;
    served?;

    tracing::info!(ticks = report.ticks, final_date = %report.final_date, "coinclock stopped");
    Ok(report)
}

//! The refresh loop: fetch, publish, advance, wait.
//!
//! [`RefreshDaemon`] owns the only [`VirtualClock`] writer and is the only
//! caller of [`CoinCatalog::replace`]. Each tick fetches the catalog for the
//! current simulated date, publishes it, and only then advances the clock, so
//! a reader never sees a snapshot dated later than `now()`.
//!
//! When a bounded retry policy gives up, the stale snapshot stays published,
//! the clock stays put, and the same date is retried after the next wait.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::clock::{ClockReader, VirtualClock};
use crate::shutdown::Shutdown;
use crate::upstream::UpstreamFetcher;
use crate::{CoinCatalog, FetchError, SimDate};

/// Result of one successful fetch and publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Snapshot for `published_for` installed and the clock moved to `now`.
    Advanced {
        published_for: SimDate,
        now: SimDate,
        coins: usize,
        attempts: u64,
    },
    /// Snapshot installed but the calendar has no next day.
    CalendarExhausted {
        published_for: SimDate,
        coins: usize,
        attempts: u64,
    },
}

impl TickOutcome {
    pub const fn published_for(&self) -> SimDate {
        match self {
            Self::Advanced { published_for, .. } | Self::CalendarExhausted { published_for, .. } => {
                *published_for
            }
        }
    }
}

/// Summary returned when the daemon stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaemonReport {
    /// Snapshots published.
    pub ticks: u64,
    /// Simulated date at exit.
    pub final_date: SimDate,
}

pub struct RefreshDaemon {
    fetcher: UpstreamFetcher,
    catalog: Arc<CoinCatalog>,
    clock: VirtualClock,
}

impl RefreshDaemon {
    pub fn new(fetcher: UpstreamFetcher, catalog: Arc<CoinCatalog>, clock: VirtualClock) -> Self {
        Self {
            fetcher,
            catalog,
            clock,
        }
    }

    pub fn catalog(&self) -> Arc<CoinCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn clock_reader(&self) -> ClockReader {
        self.clock.reader()
    }

    pub fn now(&self) -> SimDate {
        self.clock.now()
    }

    pub fn fetcher(&self) -> &UpstreamFetcher {
        &self.fetcher
    }

    /// Run one fetch, publish, advance cycle without waiting afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Cancelled`] on shutdown and [`FetchError::Exhausted`]
    /// when a bounded policy gives up. In both cases neither the catalog nor the
    /// clock is touched.
    pub async fn tick(&mut self, shutdown: &mut Shutdown) -> Result<TickOutcome, FetchError> {
        let date = self.clock.now();
        let attempts_before = self.fetcher.attempts();

        let snapshot = self.fetcher.fetch(date, shutdown).await?;
        let coins = snapshot.len();
        let attempts = self.fetcher.attempts().saturating_sub(attempts_before);

        self.catalog.replace(snapshot);

        match self.clock.advance() {
            Ok(now) => {
                tracing::info!(%date, %now, coins, attempts, "published coin snapshot");
                Ok(TickOutcome::Advanced {
                    published_for: date,
                    now,
                    coins,
                    attempts,
                })
            }
            Err(error) => {
                tracing::error!(%date, coins, error = %error, "published final coin snapshot");
                Ok(TickOutcome::CalendarExhausted {
                    published_for: date,
                    coins,
                    attempts,
                })
            }
        }
    }

    /// Loop until shutdown is requested or the calendar runs out.
    pub async fn run(mut self, mut shutdown: Shutdown) -> DaemonReport {
        let day_duration = self.clock.day_duration();
        tracing::info!(
            start = %self.clock.now(),
            day_duration_ms = u64::try_from(day_duration.as_millis()).unwrap_or(u64::MAX),
            catalog_size = self.catalog.len(),
            "refresh daemon started"
        );

        let mut ticks = 0_u64;
        loop {
            if shutdown.is_triggered() {
                break;
            }

            match self.tick(&mut shutdown).await {
                Ok(TickOutcome::Advanced { .. }) => ticks += 1,
                Ok(TickOutcome::CalendarExhausted { .. }) => {
                    ticks += 1;
                    break;
                }
                Err(FetchError::Cancelled) => break,
                Err(error) => {
                    tracing::error!(
                        date = %self.clock.now(),
                        error = %error,
                        "upstream fetch exhausted; keeping stale catalog"
                    );
                }
            }

            if !wait(day_duration, &mut shutdown).await {
                break;
            }
        }

        let report = DaemonReport {
            ticks,
            final_date: self.clock.now(),
        };
        tracing::info!(ticks = report.ticks, final_date = %report.final_date, "refresh daemon stopped");
        report
    }

    /// Start [`run`](Self::run) on the tokio runtime.
    pub fn spawn(self, shutdown: Shutdown) -> JoinHandle<DaemonReport> {
        tokio::spawn(self.run(shutdown))
    }
}

/// Sleep for `duration`; `false` if shutdown cut the wait short.
async fn wait(duration: Duration, shutdown: &mut Shutdown) -> bool {
    tokio::select! {
        biased;
        _ = shutdown.triggered() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

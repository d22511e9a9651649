//! Command-line arguments for the `coinclock` binary.
//!
//! Simulation settings are layered: [`SimulationConfig`] defaults, then the
//! `COINCLOCK_*` environment variables read by
//! [`SimulationConfig::apply_env`], then any flag given here.
//!
//! | Option | Environment | Default | Description |
//! |--------|-------------|---------|-------------|
//! | `--listen` | `COINCLOCK_LISTEN` | `127.0.0.1:8080` | HTTP listen address |
//! | `--upstream-url` | `COINCLOCK_UPSTREAM_URL` | `http://localhost:8000` | Upstream price source |
//! | `--initial-date` | `COINCLOCK_INITIAL_DATE` | `2014-01-01` | First simulated date |
//! | `--day-duration-secs` | `COINCLOCK_DAY_DURATION_SECS` | `60` | Real seconds per simulated day |
//! | `--request-timeout-ms` | `COINCLOCK_REQUEST_TIMEOUT_MS` | `3000` | Per-attempt upstream timeout |
//! | `--retry-max-attempts` | `COINCLOCK_RETRY_MAX_ATTEMPTS` | unbounded | Attempts before a tick gives up |
//! | `--retry-exponential` | `COINCLOCK_RETRY_EXPONENTIAL` | `false` | Capped exponential backoff instead of 1 s |
//! | `--retry-jitter` | `COINCLOCK_RETRY_JITTER` | `false` | ±50% jitter on exponential backoff |
//! | `--db-path` | `COINCLOCK_DB_PATH` | `coinclock.duckdb` | Seed catalog store |
//! | `--log-format` | `COINCLOCK_LOG_FORMAT` | `text` | `text` or `json` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use coinclock_core::config::MAX_EXPONENTIAL_DELAY;
use coinclock_core::{ConfigError, SimDate, SimulationConfig};

/// Serve coin prices on a simulated historical calendar.
#[derive(Debug, Clone, Parser)]
#[command(name = "coinclock", author, version, about)]
pub struct Cli {
    /// Address the HTTP server binds to.
    #[arg(long, env = "COINCLOCK_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Base URL of the upstream price source.
    #[arg(long)]
    pub upstream_url: Option<String>,

    /// First simulated date (YYYY-MM-DD or RFC 3339).
    #[arg(long)]
    pub initial_date: Option<String>,

    /// Real seconds that make up one simulated day.
    #[arg(long)]
    pub day_duration_secs: Option<u64>,

    /// Timeout for each upstream request, in milliseconds.
    #[arg(long)]
    pub request_timeout_ms: Option<u64>,

    /// Give up on a simulated day after this many attempts (default: never).
    #[arg(long)]
    pub retry_max_attempts: Option<u32>,

    /// Back off exponentially (1 s doubling, capped at 60 s) instead of a fixed 1 s.
    #[arg(long)]
    pub retry_exponential: bool,

    /// Spread exponential retry delays over ±50% (implies --retry-exponential).
    #[arg(long)]
    pub retry_jitter: bool,

    /// DuckDB file holding the seed catalog.
    #[arg(long, env = "COINCLOCK_DB_PATH", default_value = "coinclock.duckdb")]
    pub db_path: PathBuf,

    /// Log output format.
    #[arg(long, env = "COINCLOCK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// Simulation settings from the process environment and these flags.
    pub fn simulation_config(&self) -> Result<SimulationConfig, ConfigError> {
        self.simulation_config_with(|name| std::env::var(name).ok())
    }

    /// Simulation settings with environment values supplied by `lookup`.
    pub fn simulation_config_with<F>(&self, lookup: F) -> Result<SimulationConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SimulationConfig::default().apply_env(lookup)?;

        if let Some(url) = &self.upstream_url {
            config.upstream_base_url = url.trim().to_owned();
        }
        if let Some(date) = &self.initial_date {
            config.initial_date = SimDate::parse(date)?;
        }
        if let Some(secs) = self.day_duration_secs {
            config.day_duration = Duration::from_secs(secs);
        }
        if let Some(ms) = self.request_timeout_ms {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(attempts) = self.retry_max_attempts {
            config.retry.max_attempts = Some(attempts);
        }
        if self.retry_exponential {
            config = config.with_exponential_backoff(MAX_EXPONENTIAL_DELAY);
        }
        if self.retry_jitter {
            config = config.with_jittered_backoff();
        }

        config.validate()?;
        Ok(config)
    }
}

//! # Daemon Configuration
//!
//! Command-line flags (each with an environment fallback) and their
//! validation into the typed settings the daemon runs with.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use cdash_client::ClientConfig;
use cdash_common::{CdashError, Endpoint, DEFAULT_COUNTER_METHOD};

use crate::accumulator::AccumulatorConfig;

/// File name of the database inside the data directory.
pub const DB_FILE_NAME: &str = "dashboard.db";

/// Port the read surface listens on when none is given.
pub const DEFAULT_PORT: u16 = 8547;

/// Counter dashboard daemon.
#[derive(Debug, Clone, Parser)]
#[command(name = "cdash", version, about = "Polls RPC endpoints for a counter and serves daily averages")]
pub struct Cli {
    /// Data directory; the database is stored at <DIR>/dashboard.db.
    #[arg(long = "data", env = "CDASH_DATA", value_name = "DIR")]
    pub data: Option<PathBuf>,

    /// Port for the HTTP read surface.
    #[arg(long, env = "CDASH_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// RPC endpoint to poll, `http(s)://` or `ws(s)://` (repeatable).
    #[arg(
        long = "endpoint",
        env = "CDASH_ENDPOINTS",
        value_delimiter = ',',
        required = true,
        value_name = "URL"
    )]
    pub endpoints: Vec<String>,

    /// JSON-RPC method returning the counter.
    #[arg(long, default_value = DEFAULT_COUNTER_METHOD)]
    pub method: String,

    /// Seconds to sleep between rounds.
    #[arg(long, default_value_t = 600)]
    pub interval_secs: u64,

    /// Rounds in one day cycle.
    #[arg(long, default_value_t = 144)]
    pub rounds_per_day: u32,

    /// Deadline for a single endpoint call, in seconds.
    #[arg(long, default_value_t = 10)]
    pub call_timeout_secs: u64,

    /// Tracing filter directive (falls back to RUST_LOG, then "info").
    #[arg(long)]
    pub log_filter: Option<String>,
}

/// Configuration rejected before startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(transparent)]
    Endpoint(#[from] CdashError),
    #[error("at least one endpoint is required")]
    NoEndpoints,
    #[error("rounds per day must be greater than zero")]
    ZeroRounds,
    #[error("call timeout must be greater than zero")]
    ZeroTimeout,
}

/// Validated daemon settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub listen: SocketAddr,
    pub endpoints: Vec<Endpoint>,
    pub client: ClientConfig,
    pub accumulator: AccumulatorConfig,
    pub log_filter: Option<String>,
}

impl Config {
    /// Validates parsed flags.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let endpoints = cli
            .endpoints
            .iter()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| Endpoint::parse(raw))
            .collect::<Result<Vec<_>, _>>()?;
        if endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        if cli.rounds_per_day == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        if cli.call_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let db_path = match cli.data {
            Some(dir) => dir.join(DB_FILE_NAME),
            None => PathBuf::from(".").join(DB_FILE_NAME),
        };
        let call_timeout = Duration::from_secs(cli.call_timeout_secs);

        Ok(Config {
            db_path,
            listen: SocketAddr::from(([0, 0, 0, 0], cli.port)),
            endpoints,
            client: ClientConfig {
                method: cli.method,
                call_timeout,
                connect_timeout: call_timeout.min(Duration::from_secs(5)),
            },
            accumulator: AccumulatorConfig {
                interval: Duration::from_secs(cli.interval_secs),
                rounds_per_day: cli.rounds_per_day,
            },
            log_filter: cli.log_filter,
        })
    }
}

//! # cdash Daemon
//!
//! Purpose: Poll a fixed set of RPC endpoints for one counter, keep the latest
//! round sum in memory, persist a mean per calendar day, and serve both over
//! HTTP.
//!
//! ## Design Principles
//! 1. **Single Writer**: The accumulator task is the only writer of the store
//!    and of the latest value; HTTP handlers only read.
//! 2. **All-or-Nothing Rounds**: A round counts only if every endpoint answered.
//! 3. **Seams for Time and Network**: `Sampler` and `Clock` are traits so the
//!    loop runs under test without sockets or real days.
//! 4. **Cooperative Shutdown**: The loop observes a cancellation token at round
//!    and sleep boundaries.

pub mod accumulator;
pub mod aggregator;
pub mod clock;
pub mod config;
pub mod latest;
pub mod metrics;
pub mod sampler;
pub mod server;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use accumulator::{Accumulator, AccumulatorConfig, DayOutcome, DayState};
pub use aggregator::{aggregate_round, RoundOutcome};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Cli, Config, ConfigError};
pub use latest::LatestValue;
pub use metrics::{Metrics, MetricsSnapshot};
pub use sampler::{RpcSampler, SampleError, Sampler};
pub use server::{create_router, get_day_average, get_latest, serve, DayLookup, HttpState};

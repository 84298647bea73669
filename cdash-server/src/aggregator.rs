//! # Endpoint Aggregator
//!
//! Query every endpoint once and fold the answers into a single round result.
//!
//! ## Rules
//! - Endpoints are queried in list order, one at a time.
//! - A single failure makes the round invalid, but the remaining endpoints are
//!   still queried so every failure in the round is logged.
//! - An invalid round's partial sum is discarded, never reported.

use std::time::Instant;

use tracing::{debug, warn};

use cdash_common::Endpoint;

use crate::metrics::Metrics;
use crate::sampler::Sampler;

/// Result of one sampling round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Every endpoint answered; `sum` is the total of their counters.
    Valid { sum: u64 },
    /// At least one endpoint failed (or the sum overflowed).
    Invalid { failures: usize },
}

impl RoundOutcome {
    /// Returns true for a usable round.
    pub fn is_valid(&self) -> bool {
        matches!(self, RoundOutcome::Valid { .. })
    }
}

/// Runs one round over `endpoints`.
///
/// **Input**: sampler, endpoint list, metrics sink.
/// **Output**: `Valid { sum }` only when all calls succeeded.
pub async fn aggregate_round<S>(sampler: &S, endpoints: &[Endpoint], metrics: &Metrics) -> RoundOutcome
where
    S: Sampler + ?Sized,
{
    let mut sum: Option<u64> = Some(0);
    let mut failures = 0usize;

    for endpoint in endpoints {
        let started = Instant::now();
        let result = sampler.sample(endpoint).await;
        metrics.record_call(started.elapsed(), result.is_err());

        match result {
            Ok(count) => {
                debug!(endpoint = %endpoint, count, "endpoint sampled");
                sum = sum.and_then(|acc| acc.checked_add(count));
            }
            Err(err) => {
                warn!(endpoint = %endpoint, error = %err, "failed to read counter");
                failures += 1;
            }
        }
    }

    let outcome = match (failures, sum) {
        (0, Some(sum)) => RoundOutcome::Valid { sum },
        (0, None) => {
            warn!("round sum overflowed u64, discarding round");
            RoundOutcome::Invalid { failures: 0 }
        }
        (failures, _) => RoundOutcome::Invalid { failures },
    };
    metrics.record_round(outcome.is_valid());
    outcome
}

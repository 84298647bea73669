//! # Daily Accumulator
//!
//! Drive sampling rounds over a fixed-length day cycle, fold valid rounds into
//! a running total, and persist the day's mean when the cycle ends.
//!
//! ## Cycle
//!
//! ```text
//!   Sampling ──▶ Accumulating ──▶ (sleep) ──┐
//!      ▲                                    │ round budget left
//!      │◀───────────────────────────────────┘
//!      │                                    │ budget exhausted
//!      └────────────── Finalizing ◀─────────┘
//! ```
//!
//! ## Rules
//! - Every round, valid or not, spends one slot of the day's budget and is
//!   followed by the inter-round sleep.
//! - Only valid rounds touch the latest value, the total and the count.
//! - A day with zero valid rounds writes nothing.
//! - Store failures are logged; the next day starts regardless.
//! - Cancellation is honored between rounds and during sleeps; the
//!   unfinished day is abandoned.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use cdash_common::{DayKey, Endpoint};
use cdash_engine::KVStore;

use crate::aggregator::{aggregate_round, RoundOutcome};
use crate::clock::Clock;
use crate::latest::LatestValue;
use crate::metrics::Metrics;
use crate::sampler::Sampler;

/// Default pause between rounds.
pub const DEFAULT_ROUND_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Default rounds per day (24h / 10min).
pub const DEFAULT_ROUNDS_PER_DAY: u32 = 24 * 6;

/// Cadence of the sampling loop.
#[derive(Debug, Clone)]
pub struct AccumulatorConfig {
    /// Sleep after each round.
    pub interval: Duration,
    /// Round budget of one day cycle.
    pub rounds_per_day: u32,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        AccumulatorConfig {
            interval: DEFAULT_ROUND_INTERVAL,
            rounds_per_day: DEFAULT_ROUNDS_PER_DAY,
        }
    }
}

/// Running state of one day cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayState {
    // Wider than the round sums so 144 near-max rounds cannot overflow.
    total: u128,
    valid_rounds: u64,
    rounds: u32,
}

impl DayState {
    /// Creates an empty cycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one round into the cycle.
    pub fn record(&mut self, outcome: RoundOutcome) {
        self.rounds += 1;
        if let RoundOutcome::Valid { sum } = outcome {
            self.total += u128::from(sum);
            self.valid_rounds += 1;
        }
    }

    /// Returns `floor(total / valid_rounds)`, or `None` with no valid rounds.
    pub fn mean(&self) -> Option<u64> {
        if self.valid_rounds == 0 {
            return None;
        }
        // Mean of u64 values always fits in u64.
        u64::try_from(self.total / u128::from(self.valid_rounds)).ok()
    }

    /// Sum of valid round sums.
    pub fn total(&self) -> u128 {
        self.total
    }

    /// Number of valid rounds.
    pub fn valid_rounds(&self) -> u64 {
        self.valid_rounds
    }

    /// Number of rounds attempted, valid or not.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }
}

/// What happened when a day cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOutcome {
    /// Mean written under `day`.
    Persisted { day: DayKey, mean: u64 },
    /// No valid rounds; nothing written.
    Dropped { day: DayKey },
    /// Mean computed but the store rejected the write.
    WriteFailed { day: DayKey, mean: u64 },
}

/// Sampling loop owner.
pub struct Accumulator<S, K, C> {
    sampler: S,
    store: Arc<K>,
    clock: C,
    latest: LatestValue,
    metrics: Arc<Metrics>,
    endpoints: Vec<Endpoint>,
    config: AccumulatorConfig,
}

impl<S, K, C> Accumulator<S, K, C>
where
    S: Sampler,
    K: KVStore,
    C: Clock,
{
    /// Wires the loop to its collaborators.
    pub fn new(
        sampler: S,
        store: Arc<K>,
        clock: C,
        latest: LatestValue,
        metrics: Arc<Metrics>,
        endpoints: Vec<Endpoint>,
        config: AccumulatorConfig,
    ) -> Self {
        Accumulator {
            sampler,
            store,
            clock,
            latest,
            metrics,
            endpoints,
            config,
        }
    }

    /// Runs one round and folds it into `day`.
    ///
    /// **Logic**:
    /// 1. Query every endpoint through the aggregator.
    /// 2. On a valid round publish the sum as the latest value.
    /// 3. Record the round in the day state.
    pub async fn run_round(&self, day: &mut DayState) -> RoundOutcome {
        let outcome = aggregate_round(&self.sampler, &self.endpoints, &self.metrics).await;
        match outcome {
            RoundOutcome::Valid { sum } => {
                self.latest.replace(sum);
                debug!(sum, round = day.rounds() + 1, "round accepted");
            }
            RoundOutcome::Invalid { failures } => {
                warn!(failures, round = day.rounds() + 1, "round discarded");
            }
        }
        day.record(outcome);
        outcome
    }

    /// Closes a day cycle: computes the mean and writes it under today's key.
    pub fn finalize(&self, day: DayState) -> DayOutcome {
        let key = self.clock.today();
        let Some(mean) = day.mean() else {
            warn!(day = %key, rounds = day.rounds(), "no valid rounds, day dropped");
            self.metrics.record_day_dropped();
            return DayOutcome::Dropped { day: key };
        };

        info!(
            day = %key,
            average = mean,
            valid_rounds = day.valid_rounds(),
            rounds = day.rounds(),
            "submit count day average"
        );
        match self.store.put_day_average(&key, mean) {
            Ok(()) => {
                self.metrics.record_day_finalized();
                DayOutcome::Persisted { day: key, mean }
            }
            Err(err) => {
                error!(day = %key, error = %err, "put day average failed");
                self.metrics.record_store_failure();
                DayOutcome::WriteFailed { day: key, mean }
            }
        }
    }

    /// Runs one full day cycle. Returns `None` if cancelled first.
    pub async fn run_day(&self, cancel: &CancellationToken) -> Option<DayOutcome> {
        let mut day = DayState::new();
        for _ in 0..self.config.rounds_per_day {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                _ = self.run_round(&mut day) => {}
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
        Some(self.finalize(day))
    }

    /// Loops over day cycles until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            endpoints = self.endpoints.len(),
            interval_secs = self.config.interval.as_secs(),
            rounds_per_day = self.config.rounds_per_day,
            "sampling loop started"
        );
        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            let span = info_span!("day_cycle", cycle);
            match self.run_day(&cancel).instrument(span).await {
                Some(outcome) => debug!(?outcome, "day cycle complete"),
                None => break,
            }
        }
        info!("sampling loop stopped");
    }
}

impl<S, K, C> Accumulator<S, K, C>
where
    S: Sampler + 'static,
    K: KVStore + 'static,
    C: Clock + 'static,
{
    /// Spawns the loop on the tokio runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_truncates() {
        let mut day = DayState::new();
        day.record(RoundOutcome::Valid { sum: 60 });
        day.record(RoundOutcome::Invalid { failures: 1 });
        day.record(RoundOutcome::Valid { sum: 15 });

        assert_eq!(day.total(), 75);
        assert_eq!(day.valid_rounds(), 2);
        assert_eq!(day.rounds(), 3);
        assert_eq!(day.mean(), Some(37));
    }

    #[test]
    fn zero_valid_rounds_has_no_mean() {
        let mut day = DayState::new();
        day.record(RoundOutcome::Invalid { failures: 3 });
        assert_eq!(day.mean(), None);
        assert_eq!(DayState::new().mean(), None);
    }

    #[test]
    fn large_sums_do_not_overflow() {
        let mut day = DayState::new();
        for _ in 0..DEFAULT_ROUNDS_PER_DAY {
            day.record(RoundOutcome::Valid { sum: u64::MAX });
        }
        assert_eq!(day.mean(), Some(u64::MAX));
    }
}

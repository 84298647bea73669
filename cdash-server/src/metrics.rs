//! # Sampling Metrics
//!
//! Provide lightweight counters and a call-latency histogram describing how
//! the polling loop is doing: how many rounds were usable, which days were
//! finalized, and how long endpoints take to answer.
//!
//! ## Design Principles
//! 1. **Accumulator Pattern**: Use atomic counters to aggregate events cheaply.
//! 2. **Fixed Buckets**: Keep histogram buckets in a contiguous array.
//! 3. **Plain Snapshots**: Expose point-in-time values as serializable structs
//!    for the `/stats` endpoint.
//!
//! ## Notes
//! - Bucket boundaries are expressed in milliseconds; RPC calls are far slower
//!   than in-process work.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Default call-latency bucket boundaries in milliseconds.
pub const DEFAULT_LATENCY_BUCKETS_MS: [u64; 11] =
    [5, 10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000];

/// Snapshot of all sampling metrics at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Rounds attempted.
    pub rounds_total: u64,
    /// Rounds where every endpoint answered.
    pub rounds_valid: u64,
    /// Rounds discarded because at least one endpoint failed.
    pub rounds_invalid: u64,
    /// Individual endpoint call failures.
    pub endpoint_failures: u64,
    /// Days whose mean was written to the store.
    pub days_finalized: u64,
    /// Days dropped because no round was valid.
    pub days_dropped: u64,
    /// Failed writes of a daily mean.
    pub store_write_failures: u64,
    /// Endpoint call latency histogram.
    pub call_latency: LatencySnapshot,
}

/// Snapshot of the latency histogram.
#[derive(Debug, Clone, Serialize)]
pub struct LatencySnapshot {
    /// Bucket boundaries in milliseconds.
    pub bounds_ms: Vec<u64>,
    /// Bucket counts, including the overflow bucket at the end.
    pub buckets: Vec<u64>,
    /// Total number of samples.
    pub samples: u64,
    /// Sum of latencies in milliseconds.
    pub sum_ms: u64,
}

/// Thread-safe metrics aggregator for the sampling loop.
///
/// `Ordering::Relaxed` is sufficient because readers only need eventually
/// consistent totals, never cross-field ordering.
pub struct Metrics {
    rounds_total: AtomicU64,
    rounds_valid: AtomicU64,
    endpoint_failures: AtomicU64,
    days_finalized: AtomicU64,
    days_dropped: AtomicU64,
    store_write_failures: AtomicU64,
    call_latency: LatencyHistogram,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Creates a new metrics aggregator with the default latency buckets.
    pub fn new() -> Self {
        Self::with_latency_buckets(DEFAULT_LATENCY_BUCKETS_MS.to_vec())
    }

    /// Creates a new metrics aggregator with custom latency bucket boundaries.
    ///
    /// **Input**: `bounds_ms` (ascending millisecond thresholds).
    /// **Output**: a `Metrics` instance configured with those buckets.
    pub fn with_latency_buckets(bounds_ms: Vec<u64>) -> Self {
        Metrics {
            rounds_total: AtomicU64::new(0),
            rounds_valid: AtomicU64::new(0),
            endpoint_failures: AtomicU64::new(0),
            days_finalized: AtomicU64::new(0),
            days_dropped: AtomicU64::new(0),
            store_write_failures: AtomicU64::new(0),
            call_latency: LatencyHistogram::new(bounds_ms),
        }
    }

    /// Records the outcome of one round.
    pub fn record_round(&self, valid: bool) {
        self.rounds_total.fetch_add(1, Ordering::Relaxed);
        if valid {
            self.rounds_valid.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records one endpoint call and whether it failed.
    pub fn record_call(&self, latency: Duration, failed: bool) {
        self.call_latency.record(latency);
        if failed {
            self.endpoint_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a day whose mean was persisted.
    pub fn record_day_finalized(&self) {
        self.days_finalized.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a day dropped for lack of valid rounds.
    pub fn record_day_dropped(&self) {
        self.days_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed store write.
    pub fn record_store_failure(&self) {
        self.store_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of all counters and histogram buckets.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let rounds_total = self.rounds_total.load(Ordering::Relaxed);
        let rounds_valid = self.rounds_valid.load(Ordering::Relaxed);
        MetricsSnapshot {
            rounds_total,
            rounds_valid,
            rounds_invalid: rounds_total.saturating_sub(rounds_valid),
            endpoint_failures: self.endpoint_failures.load(Ordering::Relaxed),
            days_finalized: self.days_finalized.load(Ordering::Relaxed),
            days_dropped: self.days_dropped.load(Ordering::Relaxed),
            store_write_failures: self.store_write_failures.load(Ordering::Relaxed),
            call_latency: self.call_latency.snapshot(),
        }
    }
}

/// Fixed-bucket latency histogram.
///
/// Uses a linear scan to pick buckets; the list is short.
pub struct LatencyHistogram {
    bounds_ms: Vec<u64>,
    buckets: Vec<AtomicU64>,
    sum_ms: AtomicU64,
    samples: AtomicU64,
}

impl LatencyHistogram {
    /// Creates a histogram with explicit bucket boundaries (milliseconds).
    ///
    /// **Output**: histogram with `bounds_ms.len() + 1` buckets (last is overflow).
    pub fn new(bounds_ms: Vec<u64>) -> Self {
        let buckets = (0..=bounds_ms.len()).map(|_| AtomicU64::new(0)).collect();
        LatencyHistogram {
            bounds_ms,
            buckets,
            sum_ms: AtomicU64::new(0),
            samples: AtomicU64::new(0),
        }
    }

    /// Records a latency measurement into the histogram.
    ///
    /// **Logic**:
    /// 1. Convert to milliseconds (saturating).
    /// 2. Increment `samples` and add to `sum_ms`.
    /// 3. Find the first bucket where `millis <= bound`, otherwise use overflow.
    pub fn record(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.samples.fetch_add(1, Ordering::Relaxed);
        self.sum_ms.fetch_add(millis, Ordering::Relaxed);

        let idx = self
            .bounds_ms
            .iter()
            .position(|&bound| millis <= bound)
            .unwrap_or(self.bounds_ms.len());
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of the histogram.
    pub fn snapshot(&self) -> LatencySnapshot {
        LatencySnapshot {
            bounds_ms: self.bounds_ms.clone(),
            buckets: self
                .buckets
                .iter()
                .map(|bucket| bucket.load(Ordering::Relaxed))
                .collect(),
            samples: self.samples.load(Ordering::Relaxed),
            sum_ms: self.sum_ms.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_buckets_and_overflow() {
        let hist = LatencyHistogram::new(vec![10, 100]);
        hist.record(Duration::from_millis(3));
        hist.record(Duration::from_millis(10));
        hist.record(Duration::from_millis(50));
        hist.record(Duration::from_secs(2));

        let snap = hist.snapshot();
        assert_eq!(snap.buckets, vec![2, 1, 1]);
        assert_eq!(snap.samples, 4);
        assert_eq!(snap.sum_ms, 3 + 10 + 50 + 2_000);
    }

    #[test]
    fn round_and_day_counters() {
        let metrics = Metrics::new();
        metrics.record_round(true);
        metrics.record_round(false);
        metrics.record_round(true);
        metrics.record_call(Duration::from_millis(1), true);
        metrics.record_day_finalized();
        metrics.record_day_dropped();
        metrics.record_store_failure();

        let snap = metrics.snapshot();
        assert_eq!(snap.rounds_total, 3);
        assert_eq!(snap.rounds_valid, 2);
        assert_eq!(snap.rounds_invalid, 1);
        assert_eq!(snap.endpoint_failures, 1);
        assert_eq!(snap.days_finalized, 1);
        assert_eq!(snap.days_dropped, 1);
        assert_eq!(snap.store_write_failures, 1);
        assert_eq!(snap.call_latency.samples, 1);
    }
}

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use cdash_common::{DayKey, Endpoint};
use cdash_engine::{KVStore, MemoryStore};
use cdash_server::testing::ScriptedSampler;
use cdash_server::{
    get_day_average, Accumulator, AccumulatorConfig, DayLookup, DayOutcome, DayState, FixedClock,
    LatestValue, Metrics, RoundOutcome,
};

type TestAccumulator = Accumulator<ScriptedSampler, MemoryStore, FixedClock>;

struct Harness {
    accumulator: TestAccumulator,
    store: Arc<MemoryStore>,
    latest: LatestValue,
    metrics: Arc<Metrics>,
    clock: FixedClock,
}

fn today() -> DayKey {
    DayKey::from_ymd(2024, 3, 9).expect("day")
}

fn endpoints(n: usize) -> Vec<Endpoint> {
    (0..n)
        .map(|i| Endpoint::parse(&format!("http://seed{}.test:8546", i + 1)).expect("endpoint"))
        .collect()
}

fn harness(script: Vec<Vec<Option<u64>>>, endpoint_count: usize, rounds_per_day: u32) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let latest = LatestValue::new();
    let metrics = Arc::new(Metrics::new());
    let clock = FixedClock::new(today());
    let accumulator = Accumulator::new(
        ScriptedSampler::new(script),
        Arc::clone(&store),
        clock.clone(),
        latest.clone(),
        Arc::clone(&metrics),
        endpoints(endpoint_count),
        AccumulatorConfig {
            interval: Duration::from_secs(600),
            rounds_per_day,
        },
    );
    Harness {
        accumulator,
        store,
        latest,
        metrics,
        clock,
    }
}

#[tokio::test]
async fn three_round_scenario_step_by_step() {
    let h = harness(
        vec![
            vec![Some(10), Some(20), Some(30)],
            vec![Some(1), None, Some(3)],
            vec![Some(5), Some(5), Some(5)],
        ],
        3,
        3,
    );
    let mut day = DayState::new();

    assert_eq!(h.accumulator.run_round(&mut day).await, RoundOutcome::Valid { sum: 60 });
    assert_eq!(h.latest.get(), 60);
    assert_eq!((day.total(), day.valid_rounds()), (60, 1));

    assert_eq!(
        h.accumulator.run_round(&mut day).await,
        RoundOutcome::Invalid { failures: 1 }
    );
    assert_eq!(h.latest.get(), 60);
    assert_eq!((day.total(), day.valid_rounds()), (60, 1));

    assert_eq!(h.accumulator.run_round(&mut day).await, RoundOutcome::Valid { sum: 15 });
    assert_eq!(h.latest.get(), 15);
    assert_eq!((day.total(), day.valid_rounds()), (75, 2));

    let outcome = h.accumulator.finalize(day);
    assert_eq!(outcome, DayOutcome::Persisted { day: today(), mean: 37 });
    assert_eq!(h.store.get(b"2024-3-9").expect("get"), Some(37u64.to_be_bytes().to_vec()));
}

#[tokio::test(start_paused = true)]
async fn full_day_cycle_persists_mean() {
    let h = harness(
        vec![
            vec![Some(10), Some(20), Some(30)],
            vec![Some(1), None, Some(3)],
            vec![Some(5), Some(5), Some(5)],
        ],
        3,
        3,
    );
    let cancel = CancellationToken::new();

    let outcome = h.accumulator.run_day(&cancel).await;

    assert_eq!(outcome, Some(DayOutcome::Persisted { day: today(), mean: 37 }));
    assert_eq!(h.store.day_average(&today()).expect("read"), Some(37));
    let snap = h.metrics.snapshot();
    assert_eq!(snap.rounds_total, 3);
    assert_eq!(snap.rounds_valid, 2);
    assert_eq!(snap.endpoint_failures, 1);
    assert_eq!(snap.days_finalized, 1);
}

#[tokio::test(start_paused = true)]
async fn day_without_valid_rounds_writes_nothing() {
    let h = harness(
        vec![vec![None, Some(1)], vec![Some(2), None], vec![None, None]],
        2,
        3,
    );
    let cancel = CancellationToken::new();

    let outcome = h.accumulator.run_day(&cancel).await;

    assert_eq!(outcome, Some(DayOutcome::Dropped { day: today() }));
    assert!(h.store.is_empty());
    assert_eq!(h.latest.get(), 0);
    assert_eq!(get_day_average(h.store.as_ref(), "2024-3-9"), DayLookup::NotFound);
    assert_eq!(h.metrics.snapshot().days_dropped, 1);
}

#[tokio::test(start_paused = true)]
async fn failed_rounds_still_wait_the_interval() {
    let h = harness(vec![vec![None], vec![None]], 1, 2);
    let cancel = CancellationToken::new();
    let started = tokio::time::Instant::now();

    h.accumulator.run_day(&cancel).await;

    assert!(started.elapsed() >= Duration::from_secs(1200));
}

#[tokio::test(start_paused = true)]
async fn write_failure_is_not_fatal() {
    let h = harness(
        vec![vec![Some(4)], vec![Some(6)], vec![Some(8)], vec![Some(10)]],
        1,
        2,
    );
    h.store.set_fail_writes(true);
    let cancel = CancellationToken::new();

    let first = h.accumulator.run_day(&cancel).await;
    assert_eq!(first, Some(DayOutcome::WriteFailed { day: today(), mean: 5 }));
    assert_eq!(h.metrics.snapshot().store_write_failures, 1);

    h.store.set_fail_writes(false);
    h.clock.set(DayKey::from_ymd(2024, 3, 10).expect("day"));
    let second = h.accumulator.run_day(&cancel).await;

    let next_day = DayKey::from_ymd(2024, 3, 10).expect("day");
    assert_eq!(second, Some(DayOutcome::Persisted { day: next_day, mean: 9 }));
    assert_eq!(h.store.day_average(&today()).expect("read"), None);
    assert_eq!(h.store.day_average(&next_day).expect("read"), Some(9));
}

#[tokio::test(start_paused = true)]
async fn same_day_key_is_overwritten() {
    let h = harness(vec![vec![Some(100)], vec![Some(7)]], 1, 1);
    let cancel = CancellationToken::new();

    h.accumulator.run_day(&cancel).await;
    h.accumulator.run_day(&cancel).await;

    assert_eq!(h.store.write_count(), 2);
    assert_eq!(h.store.len(), 1);
    assert_eq!(h.store.day_average(&today()).expect("read"), Some(7));
}

#[tokio::test(start_paused = true)]
async fn spawned_loop_runs_days_until_cancelled() {
    let h = harness(vec![vec![Some(2)], vec![Some(4)]], 1, 2);
    let store = Arc::clone(&h.store);
    let latest = h.latest.clone();
    let cancel = CancellationToken::new();

    let handle = h.accumulator.spawn(cancel.clone());
    while store.write_count() == 0 {
        tokio::time::sleep(Duration::from_secs(60)).await;
    }
    assert_eq!(store.day_average(&today()).expect("read"), Some(3));
    assert_eq!(latest.get(), 4);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop stops promptly")
        .expect("loop task");
}

#[tokio::test(start_paused = true)]
async fn cancel_after_valid_rounds_discards_partial_day() {
    let h = harness(vec![vec![Some(5)], vec![Some(7)]], 1, 144);
    let cancel = CancellationToken::new();
    let trigger = async {
        // Rounds land at 0s and 600s; this fires during the second sleep.
        tokio::time::sleep(Duration::from_secs(900)).await;
        cancel.cancel();
    };

    let (outcome, ()) = tokio::join!(h.accumulator.run_day(&cancel), trigger);

    assert_eq!(outcome, None);
    assert!(h.store.is_empty());
    assert_eq!(h.store.write_count(), 0);
    assert_eq!(h.latest.get(), 7);
    let snap = h.metrics.snapshot();
    assert_eq!(snap.rounds_total, 2);
    assert_eq!(snap.rounds_valid, 2);
    assert_eq!(snap.days_finalized, 0);
    assert_eq!(snap.days_dropped, 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_first_round_writes_nothing() {
    let h = harness(vec![vec![Some(2)], vec![Some(4)]], 1, 144);
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert_eq!(h.accumulator.run_day(&cancel).await, None);
    assert!(h.store.is_empty());
    assert_eq!(h.latest.get(), 0);
}

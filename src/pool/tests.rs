//! Tests for the bounded pool.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use rand::Rng;

use super::BoundedPool;
use crate::aggregate::aggregate;
use crate::error::FetchError;
use crate::types::{FetchOutcome, ItemId};

fn succeed(id: ItemId) -> FetchOutcome {
    FetchOutcome::Success {
        id,
        metadata: serde_json::json!({ "tokenId": id.0 }),
    }
}

fn fail(id: ItemId) -> FetchOutcome {
    FetchOutcome::Failure {
        id,
        error: FetchError::Network {
            message: format!("token {id} unreachable"),
        },
    }
}

/// Tracks how many units are running and the highest value ever observed.
#[derive(Default)]
struct ActiveGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ActiveGauge {
    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

// -----------------------------------------------------------------------
// Construction
// -----------------------------------------------------------------------

#[test]
fn zero_concurrency_is_clamped_to_one() {
    assert_eq!(BoundedPool::new(0).concurrency(), 1);
    assert_eq!(BoundedPool::new(100).concurrency(), 100);
}

// -----------------------------------------------------------------------
// Bijection: exactly one outcome per submitted id
// -----------------------------------------------------------------------

#[tokio::test]
async fn always_succeeding_worker_yields_one_success_per_id() {
    for count in [0u64, 1, 7, 250] {
        for concurrency in [1usize, 3, 100] {
            let pool = BoundedPool::new(concurrency);

            let outcomes = pool
                .run(ItemId::range(count), |id| async move { succeed(id) })
                .await;

            assert_eq!(outcomes.len() as u64, count);
            let ids: HashSet<ItemId> = outcomes.iter().map(FetchOutcome::id).collect();
            assert_eq!(ids.len() as u64, count, "no duplicates, no drops");

            let agg = aggregate(count, outcomes);
            assert_eq!(agg.succeeded(), count);
            assert_eq!(agg.failed(), 0);
        }
    }
}

#[tokio::test]
async fn failures_do_not_cancel_other_units() {
    let pool = BoundedPool::new(4);
    let failing: HashSet<u64> = [0, 5, 6, 19].into_iter().collect();

    let outcomes = pool
        .run(ItemId::range(20), |id| {
            let fails = failing.contains(&id.0);
            async move {
                tokio::time::sleep(Duration::from_millis(1)).await;
                if fails { fail(id) } else { succeed(id) }
            }
        })
        .await;

    assert_eq!(outcomes.len(), 20);
    let agg = aggregate(20, outcomes);
    assert_eq!(agg.succeeded(), 16);
    assert_eq!(agg.failed(), 4);
    let failed: HashSet<u64> = agg.failed_ids().map(u64::from).collect();
    assert_eq!(failed, failing);
}

#[tokio::test]
async fn partition_is_independent_of_completion_order() {
    let count = 60u64;
    let failing: HashSet<u64> = (0..count).filter(|i| i % 7 == 3).collect();

    let run_once = || {
        let failing = failing.clone();
        async move {
            BoundedPool::new(8)
                .run(ItemId::range(count), |id| {
                    let delay = rand::thread_rng().gen_range(0..5u64);
                    let fails = failing.contains(&id.0);
                    async move {
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        if fails { fail(id) } else { succeed(id) }
                    }
                })
                .await
        }
    };

    let first = aggregate(count, run_once().await);
    let second = aggregate(count, run_once().await);

    assert_eq!(first.succeeded(), count - failing.len() as u64);
    assert_eq!(first.failed(), failing.len() as u64);
    assert_eq!(first, second, "aggregate content must not depend on timing");
}

// -----------------------------------------------------------------------
// Concurrency bound and admission policy
// -----------------------------------------------------------------------

#[tokio::test]
async fn never_exceeds_concurrency_bound() {
    for concurrency in [1usize, 3, 10] {
        let gauge = Arc::new(ActiveGauge::default());
        let pool = BoundedPool::new(concurrency);

        let outcomes = pool
            .run(ItemId::range(50), |id| {
                let gauge = Arc::clone(&gauge);
                let delay = rand::thread_rng().gen_range(1..4u64);
                async move {
                    gauge.enter();
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    gauge.exit();
                    succeed(id)
                }
            })
            .await;

        assert_eq!(outcomes.len(), 50);
        assert!(
            gauge.peak() <= concurrency,
            "peak {} exceeded bound {}",
            gauge.peak(),
            concurrency
        );
        assert_eq!(
            gauge.peak(),
            concurrency,
            "with more work than slots the window should fill up"
        );
    }
}

#[tokio::test]
async fn bound_larger_than_input_runs_everything_at_once() {
    let gauge = Arc::new(ActiveGauge::default());

    BoundedPool::new(100)
        .run(ItemId::range(5), |id| {
            let gauge = Arc::clone(&gauge);
            async move {
                gauge.enter();
                tokio::time::sleep(Duration::from_millis(5)).await;
                gauge.exit();
                succeed(id)
            }
        })
        .await;

    assert_eq!(gauge.peak(), 5);
}

#[tokio::test]
async fn admits_next_unit_as_soon_as_a_slot_frees() {
    // One slow unit must not hold back the rest: with a window of 2 the other
    // slot keeps cycling through the queue while unit 0 is still running.
    let slow_done = Arc::new(AtomicBool::new(false));
    let finished_before_slow = Arc::new(AtomicUsize::new(0));

    let outcomes = BoundedPool::new(2)
        .run(ItemId::range(10), |id| {
            let slow_done = Arc::clone(&slow_done);
            let finished_before_slow = Arc::clone(&finished_before_slow);
            async move {
                if id.0 == 0 {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    slow_done.store(true, Ordering::SeqCst);
                } else {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    if !slow_done.load(Ordering::SeqCst) {
                        finished_before_slow.fetch_add(1, Ordering::SeqCst);
                    }
                }
                succeed(id)
            }
        })
        .await;

    assert_eq!(outcomes.len(), 10);
    assert_eq!(
        finished_before_slow.load(Ordering::SeqCst),
        9,
        "all fast units should complete while the slow one occupies a slot"
    );
    assert_eq!(
        outcomes.last().map(FetchOutcome::id),
        Some(ItemId(0)),
        "outputs arrive in completion order"
    );
}

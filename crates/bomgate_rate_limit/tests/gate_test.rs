//! Tests for the concurrency gate under load.

use bomgate_rate_limit::ConcurrencyGate;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

async fn run_instrumented(gate: ConcurrencyGate, tasks: usize) -> usize {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..tasks {
        let gate = gate.clone();
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);
        handles.push(tokio::spawn(async move {
            let _permit = gate.acquire().await;
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            running.fetch_sub(1, Ordering::SeqCst);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    peak.load(Ordering::SeqCst)
}

#[tokio::test(start_paused = true)]
async fn test_capacity_bounds_concurrent_holders() {
    for capacity in [1, 2, 5] {
        let peak = run_instrumented(ConcurrencyGate::new(capacity), 20).await;
        assert!(peak <= capacity, "peak {} exceeded capacity {}", peak, capacity);
        assert_eq!(peak, capacity, "load should saturate the gate");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_capacity_bound_holds_on_multi_thread_runtime() {
    let peak = run_instrumented(ConcurrencyGate::new(3), 40).await;
    assert!(peak <= 3);
}

#[tokio::test(start_paused = true)]
async fn test_waiters_are_admitted_when_capacity_grows() {
    let gate = ConcurrencyGate::new(1);
    let held = gate.acquire().await;

    let waiter = {
        let gate = gate.clone();
        tokio::spawn(async move {
            let _permit = gate.acquire().await;
        })
    };

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(!waiter.is_finished());

    gate.set_capacity(2);
    waiter.await.unwrap();
    drop(held);
    assert_eq!(gate.available_permits(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_quota_gate_admits_within_budget() {
    let gate = ConcurrencyGate::with_quota(5, Some(2));
    let _a = gate.try_acquire().expect("first request within quota");
    let _b = gate.try_acquire().expect("second request within quota");
    assert!(gate.try_acquire().is_none(), "third request exceeds the quota");
}

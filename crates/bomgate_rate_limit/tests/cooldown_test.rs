//! Tests for the cooldown state machine.

use bomgate_rate_limit::{ConcurrencyGate, CooldownMachine, CooldownTransition};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

const PERIOD: Duration = Duration::from_secs(30);

fn recording_machine(
    gate: ConcurrencyGate,
) -> (CooldownMachine, Arc<Mutex<Vec<CooldownTransition>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let machine = CooldownMachine::with_listener(
        PERIOD,
        gate,
        Arc::new(move |transition| sink.lock().push(transition)),
    );
    (machine, seen)
}

#[tokio::test(start_paused = true)]
async fn test_repeated_rate_limits_schedule_one_exit() {
    let gate = ConcurrencyGate::new(1);
    let (machine, seen) = recording_machine(gate);

    assert!(machine.enter());
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!machine.enter());
    assert!(!machine.enter());

    assert_eq!(machine.exits_scheduled(), 1);
    assert_eq!(seen.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_second_rate_limit_does_not_restart_timer() {
    let gate = ConcurrencyGate::new(1);
    let machine = CooldownMachine::new(PERIOD, gate);

    machine.enter();
    let entered_at = machine.state().entered_at;

    tokio::time::sleep(Duration::from_secs(20)).await;
    machine.enter();
    assert_eq!(machine.state().entered_at, entered_at);

    // 31s after the first entry, not after the second.
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(!machine.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_exit_is_time_driven() {
    let gate = ConcurrencyGate::new(1);
    let (machine, seen) = recording_machine(gate);

    machine.enter();
    tokio::time::sleep(Duration::from_secs(29)).await;
    assert!(machine.is_active());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!machine.is_active());
    assert_eq!(machine.state().entered_at, None);
    assert_eq!(
        *seen.lock(),
        vec![
            CooldownTransition::Entered {
                saved_concurrency: None
            },
            CooldownTransition::Exited,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_reentry_after_exit_schedules_new_timer() {
    let gate = ConcurrencyGate::new(1);
    let machine = CooldownMachine::new(PERIOD, gate);

    machine.enter();
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(machine.enter());
    assert_eq!(machine.exits_scheduled(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_dropped_and_restored_after_double_period() {
    let gate = ConcurrencyGate::new(4);
    let (machine, seen) = recording_machine(gate.clone());

    machine.enter();
    assert_eq!(gate.capacity(), 1);
    assert_eq!(machine.state().saved_concurrency, Some(4));

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(!machine.is_active());
    assert_eq!(gate.capacity(), 1, "still reduced after the window closes");

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(gate.capacity(), 4);
    assert_eq!(gate.available_permits(), 4);
    assert_eq!(machine.state().saved_concurrency, None);
    assert_eq!(
        seen.lock().last().copied(),
        Some(CooldownTransition::ConcurrencyRestored(4))
    );
}

#[tokio::test(start_paused = true)]
async fn test_reentry_before_restore_pushes_restore_back() {
    let gate = ConcurrencyGate::new(4);
    let (machine, seen) = recording_machine(gate.clone());

    machine.enter();
    tokio::time::sleep(Duration::from_secs(40)).await;
    assert!(!machine.is_active());
    assert_eq!(gate.capacity(), 1);

    // Second window opens while the first restore (due at 60s) is pending.
    assert!(machine.enter());
    assert_eq!(machine.state().saved_concurrency, Some(4));

    tokio::time::sleep(Duration::from_secs(21)).await;
    assert!(machine.is_active());
    assert_eq!(gate.capacity(), 1, "first restore must not fire mid-cooldown");
    assert_eq!(machine.state().saved_concurrency, Some(4));

    tokio::time::sleep(Duration::from_secs(40)).await;
    assert_eq!(gate.capacity(), 4);
    assert_eq!(machine.state().saved_concurrency, None);

    let restores = seen
        .lock()
        .iter()
        .filter(|t| matches!(t, CooldownTransition::ConcurrencyRestored(_)))
        .count();
    assert_eq!(restores, 1);
    assert_eq!(
        seen.lock()[2],
        CooldownTransition::Entered {
            saved_concurrency: Some(4)
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_host_override_during_cooldown_wins() {
    let gate = ConcurrencyGate::new(3);
    let machine = CooldownMachine::new(PERIOD, gate.clone());

    machine.enter();
    gate.set_capacity(2);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(gate.capacity(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_entries_transition_once() {
    let gate = ConcurrencyGate::new(1);
    let machine = CooldownMachine::new(PERIOD, gate);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let machine = machine.clone();
        handles.push(tokio::spawn(async move { machine.enter() }));
    }

    let mut transitions = 0;
    for handle in handles {
        if handle.await.unwrap() {
            transitions += 1;
        }
    }

    assert_eq!(transitions, 1);
    assert_eq!(machine.exits_scheduled(), 1);
}

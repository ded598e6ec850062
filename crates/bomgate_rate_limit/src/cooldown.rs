//! Rate-limit cooldown state machine.
//!
//! Two states: **Normal** and **Cooldown**. The first rate-limit failure seen
//! in Normal enters Cooldown; further failures while cooling down change
//! nothing. Leaving Cooldown is driven by timers only, so a gateway that
//! receives no further traffic still recovers.
//!
//! Concurrency lowered on entry comes back two periods after the most recent
//! entry. A cooldown entered while a restore is still pending keeps the
//! capacity at its reduced level and pushes the restore back; the earlier
//! restore timer then fires as a no-op.

use crate::ConcurrencyGate;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Snapshot of the cooldown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CooldownState {
    /// Whether a cooldown window is open
    pub active: bool,
    /// When the current window opened
    pub entered_at: Option<Instant>,
    /// Capacity to restore once the reduced-concurrency period ends
    pub saved_concurrency: Option<usize>,
}

/// Transitions reported to a [`TransitionListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum CooldownTransition {
    /// Cooldown began; carries the capacity awaiting restore, if any
    #[display("cooldown entered")]
    Entered {
        /// Capacity before it was dropped to 1
        saved_concurrency: Option<usize>,
    },
    /// The cooldown window closed
    #[display("cooldown exited")]
    Exited,
    /// Concurrency lowered on entry was given back
    #[display("concurrency restored to {}", _0)]
    ConcurrencyRestored(usize),
}

/// Callback invoked on every transition. Runs on the timer task for exits and
/// restores, so it must not block.
pub type TransitionListener = Arc<dyn Fn(CooldownTransition) + Send + Sync>;

struct CooldownInner {
    period: Duration,
    gate: ConcurrencyGate,
    state: Mutex<CooldownState>,
    exits_scheduled: AtomicU64,
    // Bumped under the state lock each time a restore is scheduled.
    restore_epoch: AtomicU64,
    listener: Option<TransitionListener>,
}

/// Cooldown state machine owned by one gateway.
///
/// Cloning is cheap; the timer tasks hold a clone of the machine that
/// scheduled them.
///
/// # Example
///
/// ```
/// use bomgate_rate_limit::{ConcurrencyGate, CooldownMachine};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let gate = ConcurrencyGate::new(4);
/// let cooldown = CooldownMachine::new(Duration::from_secs(30), gate.clone());
///
/// assert!(cooldown.enter());
/// assert!(!cooldown.enter(), "already cooling down");
/// assert!(cooldown.is_active());
/// assert_eq!(gate.capacity(), 1);
/// # }
/// ```
#[derive(Clone)]
pub struct CooldownMachine {
    inner: Arc<CooldownInner>,
}

impl std::fmt::Debug for CooldownMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooldownMachine")
            .field("period", &self.inner.period)
            .field("state", &self.state())
            .finish()
    }
}

impl CooldownMachine {
    /// Create a machine in the Normal state.
    pub fn new(period: Duration, gate: ConcurrencyGate) -> Self {
        Self::build(period, gate, None)
    }

    /// Create a machine that reports transitions to `listener`.
    pub fn with_listener(
        period: Duration,
        gate: ConcurrencyGate,
        listener: TransitionListener,
    ) -> Self {
        Self::build(period, gate, Some(listener))
    }

    fn build(period: Duration, gate: ConcurrencyGate, listener: Option<TransitionListener>) -> Self {
        Self {
            inner: Arc::new(CooldownInner {
                period,
                gate,
                state: Mutex::new(CooldownState::default()),
                exits_scheduled: AtomicU64::new(0),
                restore_epoch: AtomicU64::new(0),
                listener,
            }),
        }
    }

    /// Report a rate-limit failure.
    ///
    /// Returns `true` if this call moved the machine from Normal to Cooldown,
    /// `false` if a cooldown was already running. Must be called from within a
    /// Tokio runtime; the exit and restore timers are spawned onto it.
    pub fn enter(&self) -> bool {
        let (saved, epoch) = {
            let mut state = self.inner.state.lock();
            if state.active {
                debug!("Rate limit reported during cooldown, timer unchanged");
                return false;
            }

            state.active = true;
            state.entered_at = Some(Instant::now());

            let saved = match state.saved_concurrency {
                Some(pending) => {
                    debug!(
                        capacity = pending,
                        "Restore still pending from previous cooldown, rescheduling"
                    );
                    Some(pending)
                }
                None => {
                    let capacity = self.inner.gate.capacity();
                    if capacity > 1 {
                        state.saved_concurrency = Some(capacity);
                        self.inner.gate.set_capacity(1);
                        Some(capacity)
                    } else {
                        None
                    }
                }
            };

            let epoch = if saved.is_some() {
                self.inner.restore_epoch.fetch_add(1, Ordering::AcqRel) + 1
            } else {
                self.inner.restore_epoch.load(Ordering::Acquire)
            };

            self.inner.exits_scheduled.fetch_add(1, Ordering::AcqRel);
            (saved, epoch)
        };

        warn!(
            period_secs = self.inner.period.as_secs(),
            saved_concurrency = ?saved,
            "Rate limit detected, entering cooldown"
        );

        let machine = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(machine.inner.period).await;
            machine.exit();
        });

        if let Some(restore_to) = saved {
            let machine = self.clone();
            let restore_after = self.inner.period.saturating_mul(2);
            tokio::spawn(async move {
                tokio::time::sleep(restore_after).await;
                machine.restore(restore_to, epoch);
            });
        }

        self.notify(CooldownTransition::Entered {
            saved_concurrency: saved,
        });
        true
    }

    fn exit(&self) {
        {
            let mut state = self.inner.state.lock();
            state.active = false;
            state.entered_at = None;
        }
        info!("Cooldown period elapsed, resuming normal pacing");
        self.notify(CooldownTransition::Exited);
    }

    fn restore(&self, restore_to: usize, epoch: u64) {
        let restored = {
            let mut state = self.inner.state.lock();
            if self.inner.restore_epoch.load(Ordering::Acquire) != epoch {
                debug!(epoch, "Restore superseded by a later cooldown");
                return;
            }
            state.saved_concurrency = None;
            // A host that changed concurrency in the meantime keeps its setting.
            if self.inner.gate.capacity() == 1 {
                self.inner.gate.set_capacity(restore_to);
                true
            } else {
                false
            }
        };

        if restored {
            info!(capacity = restore_to, "Restored concurrency after cooldown");
            self.notify(CooldownTransition::ConcurrencyRestored(restore_to));
        } else {
            debug!(
                capacity = self.inner.gate.capacity(),
                "Concurrency changed during cooldown, not restoring"
            );
        }
    }

    fn notify(&self, transition: CooldownTransition) {
        if let Some(listener) = &self.inner.listener {
            listener(transition);
        }
    }

    /// Whether a cooldown window is open.
    pub fn is_active(&self) -> bool {
        self.inner.state.lock().active
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CooldownState {
        *self.inner.state.lock()
    }

    /// Length of the cooldown window.
    pub fn period(&self) -> Duration {
        self.inner.period
    }

    /// Number of exit timers scheduled since creation.
    pub fn exits_scheduled(&self) -> u64 {
        self.inner.exits_scheduled.load(Ordering::Acquire)
    }
}

//! Admission control using a Tokio Semaphore and an optional governor quota.
//!
//! The gate bounds how many wrapped calls run at once. Its capacity can change
//! at runtime:
//! - Growing grants the extra permits immediately
//! - Shrinking withdraws idle permits at once and the rest as in-flight calls
//!   finish, without interrupting work already admitted

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use parking_lot::Mutex;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

// Type alias for our direct rate limiter
type DirectRateLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Debug, Default)]
struct GateState {
    capacity: usize,
    /// Permits to withdraw as soon as busy holders release them.
    debt: usize,
}

struct GateShared {
    semaphore: Arc<Semaphore>,
    state: Mutex<GateState>,
    in_flight: AtomicUsize,
    quota: Option<DirectRateLimiter>,
}

/// Counting admission gate with mutable capacity.
///
/// Cloning is cheap; clones share the same permits.
///
/// # Example
///
/// ```
/// use bomgate_rate_limit::ConcurrencyGate;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let gate = ConcurrencyGate::new(1);
///
/// let permit = gate.acquire().await;
/// assert!(gate.try_acquire().is_none());
///
/// drop(permit);
/// assert!(gate.try_acquire().is_some());
/// # }
/// ```
#[derive(Clone)]
pub struct ConcurrencyGate {
    shared: Arc<GateShared>,
}

impl std::fmt::Debug for ConcurrencyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrencyGate")
            .field("capacity", &self.capacity())
            .field("available", &self.available_permits())
            .field("in_flight", &self.in_flight())
            .field("quota", &self.shared.quota.is_some())
            .finish()
    }
}

impl ConcurrencyGate {
    /// Create a gate admitting `capacity` concurrent calls (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self::build(capacity, None)
    }

    /// Create a gate that additionally paces admissions to a requests-per-minute quota.
    pub fn with_quota(capacity: usize, requests_per_minute: Option<u32>) -> Self {
        let quota = requests_per_minute.and_then(NonZeroU32::new).map(|n| {
            debug!(rpm = n.get(), "Configuring requests-per-minute quota");
            GovernorRateLimiter::direct(Quota::per_minute(n))
        });
        Self::build(capacity, quota)
    }

    fn build(capacity: usize, quota: Option<DirectRateLimiter>) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(GateShared {
                semaphore: Arc::new(Semaphore::new(capacity)),
                state: Mutex::new(GateState { capacity, debt: 0 }),
                in_flight: AtomicUsize::new(0),
                quota,
            }),
        }
    }

    /// Wait for admission.
    ///
    /// Waits for the quota first (if any) so that no permit is held while
    /// merely waiting for the rate window.
    pub async fn acquire(&self) -> GatePermit {
        if let Some(quota) = &self.shared.quota {
            quota.until_ready().await;
        }

        let permit = self
            .shared
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("Semaphore should not be closed");

        self.admit(permit)
    }

    /// Try to get admission without waiting.
    pub fn try_acquire(&self) -> Option<GatePermit> {
        if let Some(quota) = &self.shared.quota {
            quota.check().ok()?;
        }
        let permit = self.shared.semaphore.clone().try_acquire_owned().ok()?;
        Some(self.admit(permit))
    }

    fn admit(&self, permit: OwnedSemaphorePermit) -> GatePermit {
        self.shared.in_flight.fetch_add(1, Ordering::AcqRel);
        GatePermit {
            permit: Some(permit),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Change the capacity (minimum 1). Returns the previous capacity.
    pub fn set_capacity(&self, capacity: usize) -> usize {
        let capacity = capacity.max(1);
        let mut state = self.shared.state.lock();
        let previous = state.capacity;

        if capacity > previous {
            let mut grant = capacity - previous;
            let forgiven = grant.min(state.debt);
            state.debt -= forgiven;
            grant -= forgiven;
            if grant > 0 {
                self.shared.semaphore.add_permits(grant);
            }
        } else if capacity < previous {
            for _ in 0..(previous - capacity) {
                match self.shared.semaphore.try_acquire() {
                    Ok(idle) => idle.forget(),
                    Err(_) => state.debt += 1,
                }
            }
        }

        state.capacity = capacity;
        info!(
            previous,
            capacity,
            pending_withdrawals = state.debt,
            "Concurrency capacity changed"
        );
        previous
    }

    /// Current capacity.
    pub fn capacity(&self) -> usize {
        self.shared.state.lock().capacity
    }

    /// Permits available right now.
    pub fn available_permits(&self) -> usize {
        self.shared.semaphore.available_permits()
    }

    /// Calls currently admitted.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::Acquire)
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(1)
    }
}

/// RAII admission permit.
///
/// Dropping it releases the slot, or withdraws it if the gate shrank while the
/// call was running.
pub struct GatePermit {
    permit: Option<OwnedSemaphorePermit>,
    shared: Arc<GateShared>,
}

impl std::fmt::Debug for GatePermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatePermit").finish_non_exhaustive()
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.shared.in_flight.fetch_sub(1, Ordering::AcqRel);
        if let Some(permit) = self.permit.take() {
            let mut state = self.shared.state.lock();
            if state.debt > 0 {
                state.debt -= 1;
                permit.forget();
            }
        }
    }
}

//! Progress events published by the gateway.

use bomgate_error::FailureClass;
use std::time::Duration;

/// Something a host may want to show the user.
///
/// Events are broadcast; a host that does not subscribe loses nothing, and a
/// slow subscriber only drops its own backlog.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum GatewayEvent {
    /// An attempt was admitted and is about to call the service
    #[display("{} attempt {}", operation, attempt)]
    AttemptStarted {
        /// Operation name
        operation: String,
        /// Attempt number, starting at 1
        attempt: u32,
    },
    /// The result was served from the cache
    #[display("{} served from cache", operation)]
    CacheHit {
        /// Operation name
        operation: String,
    },
    /// An attempt succeeded
    #[display("{} succeeded on attempt {} in {:?}", operation, attempt, latency)]
    Succeeded {
        /// Operation name
        operation: String,
        /// Attempt number, starting at 1
        attempt: u32,
        /// Time spent in the remote call
        latency: Duration,
    },
    /// An attempt failed and another will follow
    #[display("{} attempt {} failed ({}), retrying in {:?}", operation, attempt, class, delay)]
    RetryScheduled {
        /// Operation name
        operation: String,
        /// Attempt that failed
        attempt: u32,
        /// How the failure was classified
        class: FailureClass,
        /// Backoff before the next attempt
        delay: Duration,
    },
    /// The operation gave up
    #[display("{} failed after {} attempts: {}", operation, attempts, message)]
    Failed {
        /// Operation name
        operation: String,
        /// Attempts made
        attempts: u32,
        /// Final error message
        message: String,
    },
    /// Server throttling started a cooldown window
    #[display("rate limited, cooling down")]
    CooldownEntered {
        /// Capacity awaiting restoration, if concurrency is lowered
        saved_concurrency: Option<usize>,
    },
    /// The cooldown window closed
    #[display("cooldown finished")]
    CooldownExited,
    /// Admission capacity changed
    #[display("concurrency {} -> {}", previous, current)]
    ConcurrencyChanged {
        /// Capacity before the change
        previous: usize,
        /// Capacity after the change
        current: usize,
    },
}

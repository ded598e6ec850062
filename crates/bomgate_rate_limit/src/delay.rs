//! Adaptive pacing delay.

use crate::{PacingConfig, ResponseTimeTracker};
use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Everything the pacing delay depends on, captured at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DelayInputs {
    /// Mean of recent successful latencies, if any were recorded
    pub average_latency: Option<Duration>,
    /// Errors observed since the last success
    pub consecutive_errors: u32,
    /// Whether the gateway is in a rate-limit cooldown
    pub cooldown_active: bool,
}

/// Derives the delay applied after each attempt, before its permit is released.
///
/// The delay paces how quickly new calls are admitted. It grows with the
/// server's own observed response time and doubles per consecutive error, and
/// sits at a conservative fixed value while the gateway is cooling down.
///
/// The pacer owns the response-time history and the consecutive-error counter.
///
/// # Example
///
/// ```
/// use bomgate_rate_limit::{AdaptivePacer, DelayInputs, PacingConfig};
/// use std::time::Duration;
///
/// let pacer = AdaptivePacer::new(PacingConfig::default());
///
/// let inputs = DelayInputs {
///     average_latency: Some(Duration::from_millis(800)),
///     consecutive_errors: 1,
///     cooldown_active: false,
/// };
/// // max(300, 0.75 * 800) = 600, doubled for one error
/// assert_eq!(pacer.unjittered_delay(inputs), Duration::from_millis(1200));
/// ```
#[derive(Debug)]
pub struct AdaptivePacer {
    config: PacingConfig,
    tracker: ResponseTimeTracker,
    consecutive_errors: AtomicU32,
}

impl AdaptivePacer {
    /// Create a pacer with an empty history.
    pub fn new(config: PacingConfig) -> Self {
        let tracker = ResponseTimeTracker::new(config.tracker_capacity);
        Self {
            config,
            tracker,
            consecutive_errors: AtomicU32::new(0),
        }
    }

    /// Pacing configuration.
    pub fn config(&self) -> &PacingConfig {
        &self.config
    }

    /// Latency history.
    pub fn tracker(&self) -> &ResponseTimeTracker {
        &self.tracker
    }

    /// Record a successful call: its latency joins the history and the error
    /// streak ends.
    pub fn record_success(&self, latency: Duration) {
        self.tracker.record(latency);
        self.consecutive_errors.store(0, Ordering::Release);
    }

    /// Record a failed call. Returns the new consecutive-error count.
    pub fn record_error(&self) -> u32 {
        self.consecutive_errors
            .fetch_add(1, Ordering::AcqRel)
            .saturating_add(1)
    }

    /// Errors observed since the last success.
    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors.load(Ordering::Acquire)
    }

    /// Snapshot the current inputs.
    pub fn inputs(&self, cooldown_active: bool) -> DelayInputs {
        DelayInputs {
            average_latency: self.tracker.average(),
            consecutive_errors: self.consecutive_errors(),
            cooldown_active,
        }
    }

    /// Current pacing delay, jitter included.
    pub fn current_delay(&self, cooldown_active: bool) -> Duration {
        self.delay_with(self.inputs(cooldown_active), &mut rand::thread_rng())
    }

    /// Pacing delay for `inputs` before jitter.
    pub fn unjittered_delay(&self, inputs: DelayInputs) -> Duration {
        let base = Duration::from_millis(self.config.base_delay_ms);

        if inputs.cooldown_active {
            return base.max(Duration::from_millis(self.config.cooldown_delay_ms));
        }

        let mut delay = base;
        if let Some(average) = inputs.average_latency {
            let weighted = average.as_nanos() as f64 * self.config.latency_weight.max(0.0);
            delay = delay.max(Duration::from_nanos(weighted.round() as u64));
        }

        if inputs.consecutive_errors > 0 {
            let exponent = inputs.consecutive_errors.min(self.config.max_error_exponent).min(31);
            let scaled = delay.saturating_mul(1u32 << exponent);
            delay = scaled.min(Duration::from_millis(self.config.max_delay_ms));
        }

        delay
    }

    /// Pacing delay for `inputs`, with additive jitter in
    /// `[0, max(min_jitter, delay / 5))`. No jitter is added during cooldown.
    pub fn delay_with<R: Rng + ?Sized>(&self, inputs: DelayInputs, rng: &mut R) -> Duration {
        let delay = self.unjittered_delay(inputs);
        if inputs.cooldown_active {
            return delay;
        }

        let window = Duration::from_millis(self.config.min_jitter_ms).max(delay / 5);
        if window.is_zero() {
            return delay;
        }
        let jitter_ms = rng.gen_range(0..window.as_millis().max(1) as u64);
        delay + Duration::from_millis(jitter_ms)
    }
}

impl Default for AdaptivePacer {
    fn default() -> Self {
        Self::new(PacingConfig::default())
    }
}

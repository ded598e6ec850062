//! Jittered exponential backoff between retries.

use rand::Rng;
use std::time::Duration;

/// Multiplicative jitter applied to a backoff delay.
///
/// A delay `d` becomes `d * U(min, max)`, which keeps many clients that were
/// throttled at the same moment from retrying in lockstep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterRange {
    min: f64,
    max: f64,
}

impl JitterRange {
    /// Create a jitter range. Bounds are reordered if swapped and clamped to be
    /// non-negative.
    pub fn new(min: f64, max: f64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min: min.max(0.0),
            max: max.max(0.0),
        }
    }

    /// Lower bound.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Apply a random factor from this range to `delay`.
    pub fn apply<R: Rng + ?Sized>(&self, delay: Duration, rng: &mut R) -> Duration {
        let factor = if self.max > self.min {
            rng.gen_range(self.min..=self.max)
        } else {
            self.min
        };
        delay.mul_f64(factor)
    }
}

impl Default for JitterRange {
    fn default() -> Self {
        Self::new(0.8, 1.2)
    }
}

/// Exponential backoff curve: `min(max, base * multiplier^retry)`.
///
/// # Example
///
/// ```
/// use bomgate_rate_limit::BackoffCurve;
/// use std::time::Duration;
///
/// let curve = BackoffCurve::new(Duration::from_secs(2), 2.5, Duration::from_secs(60));
///
/// assert_eq!(curve.delay_for(0), Duration::from_secs(2));
/// assert_eq!(curve.delay_for(1), Duration::from_secs(5));
/// assert_eq!(curve.delay_for(2), Duration::from_millis(12_500));
/// assert_eq!(curve.delay_for(10), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffCurve {
    base: Duration,
    multiplier: f64,
    max: Duration,
}

impl BackoffCurve {
    /// Create a curve. Multipliers below 1 are raised to 1 so the curve never
    /// shrinks.
    pub fn new(base: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            base,
            multiplier: multiplier.max(1.0),
            max,
        }
    }

    /// Curve used after a rate-limit failure: 2s, x2.5, capped at 60s.
    pub fn rate_limited() -> Self {
        Self::new(Duration::from_secs(2), 2.5, Duration::from_secs(60))
    }

    /// Curve used after any other retryable failure: 1s, x2, capped at 30s.
    pub fn transient() -> Self {
        Self::new(Duration::from_secs(1), 2.0, Duration::from_secs(30))
    }

    /// Un-jittered delay before retry number `retry` (0 = first retry).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let scaled = self.base.as_nanos() as f64 * self.multiplier.powi(exponent);
        if !scaled.is_finite() || scaled >= self.max.as_nanos() as f64 {
            self.max
        } else {
            Duration::from_nanos(scaled.round() as u64)
        }
    }

    /// Jittered delay before retry number `retry`.
    ///
    /// Jitter is applied after the cap, so capped delays stay spread out.
    pub fn jittered<R: Rng + ?Sized>(&self, retry: u32, jitter: JitterRange, rng: &mut R) -> Duration {
        jitter.apply(self.delay_for(retry), rng)
    }

    /// Upper bound of the curve before jitter.
    pub fn max(&self) -> Duration {
        self.max
    }
}

//! Bounded history of recent response times.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// Fixed-capacity FIFO of operation latencies.
///
/// Only successful calls should be recorded; failed round-trips are often
/// artificially short (immediate 429) or long (timeouts) and would skew the
/// pacing estimate.
///
/// # Example
///
/// ```
/// use bomgate_rate_limit::ResponseTimeTracker;
/// use std::time::Duration;
///
/// let tracker = ResponseTimeTracker::new(2);
/// tracker.record(Duration::from_millis(100));
/// tracker.record(Duration::from_millis(200));
/// tracker.record(Duration::from_millis(400)); // evicts the 100ms sample
///
/// assert_eq!(tracker.len(), 2);
/// assert_eq!(tracker.average(), Some(Duration::from_millis(300)));
/// ```
#[derive(Debug)]
pub struct ResponseTimeTracker {
    capacity: usize,
    samples: Mutex<VecDeque<Duration>>,
}

impl ResponseTimeTracker {
    /// Create a tracker holding at most `capacity` samples (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Record a latency, evicting the oldest sample when full.
    pub fn record(&self, latency: Duration) {
        let mut samples = self.samples.lock();
        while samples.len() >= self.capacity {
            samples.pop_front();
        }
        samples.push_back(latency);
    }

    /// Arithmetic mean of the current samples, if any.
    pub fn average(&self) -> Option<Duration> {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return None;
        }
        let total: Duration = samples.iter().sum();
        Some(total / samples.len() as u32)
    }

    /// Mean of the current samples, or `default` when there are none.
    pub fn average_or(&self, default: Duration) -> Duration {
        self.average().unwrap_or(default)
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    /// True when no sample has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    /// Maximum number of samples held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ResponseTimeTracker {
    fn default() -> Self {
        Self::new(15)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tracker_uses_default() {
        let tracker = ResponseTimeTracker::default();
        assert!(tracker.is_empty());
        assert_eq!(tracker.average(), None);
        assert_eq!(
            tracker.average_or(Duration::from_millis(300)),
            Duration::from_millis(300)
        );
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let tracker = ResponseTimeTracker::new(15);
        for ms in 0..100 {
            tracker.record(Duration::from_millis(ms));
            assert!(tracker.len() <= 15);
        }
        // Samples 85..=99 remain.
        assert_eq!(tracker.average(), Some(Duration::from_millis(92)));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let tracker = ResponseTimeTracker::new(0);
        tracker.record(Duration::from_millis(5));
        tracker.record(Duration::from_millis(7));
        assert_eq!(tracker.capacity(), 1);
        assert_eq!(tracker.average(), Some(Duration::from_millis(7)));
    }
}

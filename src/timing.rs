//! Monotonic session clock.
//!
//! All dwell and hold computations consume explicit second timestamps taken
//! from one clock, so the guidance machine stays deterministic under test.

use std::sync::Arc;
use std::time::Instant;

/// Monotonic clock for session timestamps.
///
/// All hold/dwell timing derives from this single source to ensure
/// monotonic ordering across the pose loop and the texture timer.
#[derive(Debug, Clone)]
pub struct ScanClock {
    start: Arc<Instant>,
}

impl ScanClock {
    /// Create a new clock with the current instant as time zero.
    pub fn new() -> Self {
        Self {
            start: Arc::new(Instant::now()),
        }
    }

    /// Create a clock from an existing start instant.
    ///
    /// Use this to share the same timebase between components.
    pub fn from_instant(start: Instant) -> Self {
        Self {
            start: Arc::new(start),
        }
    }

    /// Seconds elapsed since clock creation.
    #[inline]
    pub fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Get the start instant for sharing with other components.
    pub fn start_instant(&self) -> Instant {
        *self.start
    }
}

impl Default for ScanClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_monotonic() {
        let clock = ScanClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_shared_timebase() {
        let clock = ScanClock::new();
        let other = ScanClock::from_instant(clock.start_instant());
        assert!((clock.now() - other.now()).abs() < 0.05);
    }
}

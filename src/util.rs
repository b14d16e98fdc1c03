//! Miscellaneous utility structs and functions.

/// Tracks when a recurring action is next due on the simulation clock.
///
/// The cadence is decoupled from the simulation step size: several steps may
/// pass before the action is due, and if a single step jumps past the
/// interval the action fires once, not repeatedly.
#[derive(Clone, Copy, Debug)]
pub struct Cadence {
    /// Seconds between firings.
    interval: f64,
    /// Simulation time of the last firing.
    last: f64,
}

impl Cadence {
    /// Creates a cadence that first fires once `interval` seconds of
    /// simulation time have elapsed.
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            last: 0.0,
        }
    }

    /// Returns true, and rearms, when at least the interval has elapsed
    /// since the last firing.
    pub fn due(&mut self, now: f64) -> bool {
        if now - self.last >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

/// Rounds to two decimal places. Applied only at the reporting boundary;
/// internal accumulation always carries full precision.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cadence_fires_on_the_interval() {
        let mut cadence = Cadence::new(60.0);
        assert!(!cadence.due(30.0));
        assert!(!cadence.due(59.9));
        assert!(cadence.due(60.0));
        // Rearmed from the firing time, not accumulated.
        assert!(!cadence.due(119.0));
        assert!(cadence.due(120.0));
    }

    #[test]
    fn cadence_fires_once_per_large_step() {
        let mut cadence = Cadence::new(1.0);
        assert!(cadence.due(5.0));
        assert!(!cadence.due(5.5));
        assert!(cadence.due(6.0));
    }

    #[test]
    fn round2_is_two_decimals() {
        assert_eq!(round2(1.006), 1.01);
        assert_eq!(round2(12.3449), 12.34);
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(0.0), 0.0);
    }
}

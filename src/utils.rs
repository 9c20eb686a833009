//! Small helpers shared across modules.

pub mod safe_cast;

use std::time::Instant;

/// Source of frame timestamps in seconds
pub trait Clock: Send {
    /// Timestamp for the frame being evaluated
    fn now(&mut self) -> f64;
}

/// Monotonic clock in seconds, measured from construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start counting from now
    #[must_use]
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Seconds since the clock started
    #[must_use]
    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for MonotonicClock {
    fn now(&mut self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock advancing a fixed step per reading, for replays at a nominal frame rate
#[derive(Debug, Clone, Copy)]
pub struct FixedStepClock {
    step: f64,
    ticks: u32,
}

impl FixedStepClock {
    /// First reading is 0.0, each later one `step` seconds on
    #[must_use]
    pub const fn new(step: f64) -> Self {
        Self { step, ticks: 0 }
    }
}

impl Clock for FixedStepClock {
    fn now(&mut self) -> f64 {
        let now = f64::from(self.ticks) * self.step;
        self.ticks = self.ticks.saturating_add(1);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_monotonic() {
        let clock = MonotonicClock::start();
        let first = clock.now();
        let second = clock.now();
        assert!(first >= 0.0);
        assert!(second >= first);
    }

    #[test]
    fn test_fixed_step_clock() {
        let mut clock = FixedStepClock::new(0.5);
        assert_eq!(Clock::now(&mut clock), 0.0);
        assert_eq!(Clock::now(&mut clock), 0.5);
        assert_eq!(Clock::now(&mut clock), 1.0);
    }
}

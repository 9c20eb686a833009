//! Smoothing filters for cursor targets.
//!
//! The cursor mapper emits a target every frame; these filters trade a
//! little latency for less jitter. The mapping formula and the edge clamp
//! are unaffected: filters run on raw targets before clamping.

/// Moving average filter over the last N targets
pub mod moving_average;

/// Exponential filter for responsive smoothing
pub mod exponential;

use crate::{Error, Result};

/// Trait for all cursor filters
pub trait CursorFilter: Send + Sync {
    /// Apply filter to a raw target
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64);

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl CursorFilter for NoFilter {
    fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        (x, y)
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a cursor filter from `name[:parameter]`.
///
/// Accepted forms: `none`, `moving_average[:window]`, `exponential[:alpha]`.
pub fn create_filter(spec: &str) -> Result<Box<dyn CursorFilter>> {
    let lowered = spec.trim().to_lowercase();
    let (name, parameter) = match lowered.split_once(':') {
        Some((name, parameter)) => (name, Some(parameter)),
        None => (lowered.as_str(), None),
    };

    match name {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "moving_average" | "movingaverage" => {
            let window = match parameter {
                Some(p) => p
                    .parse::<usize>()
                    .map_err(|_| Error::InvalidInput(format!("Window size must be a positive integer: {p}")))?,
                None => 5,
            };
            if window == 0 {
                return Err(Error::InvalidInput("Window size must be greater than 0".to_string()));
            }
            Ok(Box::new(moving_average::MovingAverageFilter::new(window)))
        }
        "exponential" => {
            let alpha = match parameter {
                Some(p) => p
                    .parse::<f64>()
                    .map_err(|_| Error::InvalidInput(format!("Alpha must be a number: {p}")))?,
                None => 0.5,
            };
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(Error::InvalidInput(format!("Alpha must be in (0, 1], got {alpha}")));
            }
            Ok(Box::new(exponential::ExponentialFilter::new(alpha)))
        }
        _ => Err(Error::InvalidInput(format!("Unknown filter type: {spec}"))),
    }
}

/// Filter matching a smoothing window size, window 1 (or 0) disables smoothing
pub fn smoothing_filter(window: usize) -> Box<dyn CursorFilter> {
    if window <= 1 {
        Box::new(NoFilter)
    } else {
        Box::new(moving_average::MovingAverageFilter::new(window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter() {
        let mut filter = NoFilter;
        let (x, y) = filter.apply(10.0, 20.0);
        assert_eq!(x, 10.0);
        assert_eq!(y, 20.0);
    }

    #[test]
    fn test_create_filter() {
        assert!(create_filter("none").is_ok());
        assert!(create_filter("moving_average:3").is_ok());
        assert!(create_filter("exponential:0.3").is_ok());
        assert!(create_filter("unknown").is_err());
    }

    #[test]
    fn test_create_filter_rejects_bad_parameters() {
        for spec in ["moving_average:0", "moving_average:-2", "moving_average:abc", "exponential:0", "exponential:1.5"] {
            assert!(create_filter(spec).is_err(), "Expected error for {spec}");
        }
    }

    #[test]
    fn test_smoothing_filter_window_one_is_identity() {
        assert_eq!(smoothing_filter(1).name(), "NoFilter");
        assert_eq!(smoothing_filter(4).name(), "MovingAverageFilter");
    }
}

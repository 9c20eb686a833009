//! Checked conversions into signed pixel coordinates.
//!
//! X11 takes `i16`/`i32` positions, while screen sizes arrive as `u32` and
//! mapped targets as `f64`.

use crate::{Error, Result};

/// Screen dimension as a signed coordinate
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when the dimension exceeds `i32::MAX`.
pub fn dimension(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::InvalidInput(format!("Screen dimension {value} exceeds i32")))
}

/// Round a mapped target to the nearest pixel
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for NaN, infinities and values outside `i32`.
#[allow(clippy::cast_possible_truncation)] // rounded and range-checked first
pub fn pixel(value: f64) -> Result<i32> {
    let rounded = value.round();
    if rounded.is_finite() && (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&rounded) {
        Ok(rounded as i32)
    } else {
        Err(Error::InvalidInput(format!("Target {value} is not a pixel coordinate")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dimension_limits() {
        assert_eq!(dimension(1920).unwrap(), 1920);
        assert!(dimension(u32::MAX).is_err());
        assert!(dimension(1 << 31).is_err());
    }

    #[test]
    fn test_pixel_rounds_to_nearest() {
        assert_eq!(pixel(1607.6).unwrap(), 1608);
        assert_eq!(pixel(10.4).unwrap(), 10);
        assert_eq!(pixel(-0.6).unwrap(), -1);
    }

    #[test]
    fn test_pixel_rejects_non_finite() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 3.0e9] {
            assert!(pixel(bad).is_err(), "{bad} accepted");
        }
    }

    proptest! {
        #[test]
        fn prop_screen_range_targets_convert(value in 0.0f64..8192.0) {
            let converted = pixel(value).unwrap();
            prop_assert!((f64::from(converted) - value).abs() <= 0.5);
        }
    }
}

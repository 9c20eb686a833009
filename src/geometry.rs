//! Geometry extraction: scalar gesture signals from a landmark set.

use crate::{
    constants::{
        FACE_LEFT, FACE_RIGHT, LEFT_EYE_BOTTOM, LEFT_EYE_TOP, LOWER_LIP, MAR_EPSILON,
        MAX_LANDMARK_INDEX, MOUTH_LEFT, MOUTH_RIGHT, NOSE_TIP, RIGHT_EYE_BOTTOM, RIGHT_EYE_TOP,
        UPPER_LIP,
    },
    landmarks::{Landmark, LandmarkSet},
    Error, Result,
};
use log::debug;

/// Per-frame signals consumed by the gesture machines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    /// Horizontal nose position in [0, 1]
    pub nose_x: f64,
    /// Vertical nose position in [0, 1]
    pub nose_y: f64,
    /// Vertical lid gap of the left eye
    pub left_eye_openness: f64,
    /// Vertical lid gap of the right eye
    pub right_eye_openness: f64,
    /// Vertical lip gap divided by mouth width
    pub mouth_aspect_ratio: f64,
    /// Horizontal distance between the face edges
    pub face_width: f64,
}

/// Derive [`Signals`] from a landmark set.
///
/// # Errors
///
/// Returns [`Error::InsufficientLandmarks`] when the set is too short to
/// contain every index read here.
pub fn extract(landmarks: &LandmarkSet) -> Result<Signals> {
    let point = |index: usize| -> Result<&Landmark> {
        landmarks.get(index).ok_or(Error::InsufficientLandmarks {
            required: MAX_LANDMARK_INDEX + 1,
            actual: landmarks.len(),
        })
    };

    let nose = point(NOSE_TIP)?;
    let left_eye_openness = (point(LEFT_EYE_TOP)?.y - point(LEFT_EYE_BOTTOM)?.y).abs();
    let right_eye_openness = (point(RIGHT_EYE_TOP)?.y - point(RIGHT_EYE_BOTTOM)?.y).abs();
    let face_width = (point(FACE_RIGHT)?.x - point(FACE_LEFT)?.x).abs();
    let mouth_aspect_ratio = mouth_aspect_ratio(
        point(UPPER_LIP)?,
        point(LOWER_LIP)?,
        point(MOUTH_LEFT)?,
        point(MOUTH_RIGHT)?,
    );

    Ok(Signals {
        nose_x: nose.x,
        nose_y: nose.y,
        left_eye_openness,
        right_eye_openness,
        mouth_aspect_ratio,
        face_width,
    })
}

/// Lip gap over mouth width, 0 when the mouth corners coincide
fn mouth_aspect_ratio(upper: &Landmark, lower: &Landmark, left: &Landmark, right: &Landmark) -> f64 {
    let vertical = (upper.y - lower.y).abs();
    let horizontal = (left.x - right.x).abs();

    if horizontal == 0.0 {
        debug!("Mouth width is zero, reporting MAR as 0");
        return 0.0;
    }

    vertical / (horizontal + MAR_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::SyntheticFace;

    #[test]
    fn test_extract_synthetic_face() {
        let face = SyntheticFace::default()
            .with_nose(0.3, 0.6)
            .with_eyes(0.02, 0.01)
            .with_mouth_opening(0.05)
            .build();

        let signals = extract(&face).unwrap();
        assert_eq!(signals.nose_x, 0.3);
        assert_eq!(signals.nose_y, 0.6);
        assert!((signals.left_eye_openness - 0.02).abs() < 1e-12);
        assert!((signals.right_eye_openness - 0.01).abs() < 1e-12);
        assert!((signals.face_width - 0.4).abs() < 1e-12);
        assert!((signals.mouth_aspect_ratio - 0.05 / (0.1 + MAR_EPSILON)).abs() < 1e-9);
    }

    #[test]
    fn test_extract_is_idempotent() {
        let face = SyntheticFace::default().with_mouth_opening(0.07).build();
        assert_eq!(extract(&face).unwrap(), extract(&face).unwrap());
    }

    #[test]
    fn test_zero_mouth_width_gives_zero_mar() {
        let mut face = SyntheticFace::default().with_mouth_opening(0.08);
        face.mouth_width = 0.0;
        let signals = extract(&face.build()).unwrap();
        assert_eq!(signals.mouth_aspect_ratio, 0.0);
    }

    #[test]
    fn test_short_landmark_set_is_rejected() {
        let set = LandmarkSet::new(vec![Landmark::default(); 100]);
        match extract(&set) {
            Err(Error::InsufficientLandmarks { required, actual }) => {
                assert_eq!(required, MAX_LANDMARK_INDEX + 1);
                assert_eq!(actual, 100);
            }
            other => panic!("Expected InsufficientLandmarks, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_landmark_set_is_rejected() {
        assert!(extract(&LandmarkSet::new(Vec::new())).is_err());
    }
}

//! Facial landmark sets and the source contract that supplies them.
//!
//! A [`LandmarkSet`] is one face-mesh detection for one frame: a fixed-size,
//! index-addressed list of normalized coordinates. Sources hand sets to the
//! frame worker, which discards them after the gesture machines ran.

use crate::{constants::NUM_REFINED_FACE_MESH_LANDMARKS, Result};
use std::collections::VecDeque;

/// A single normalized landmark
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    /// Horizontal position, 0.0 = left edge of the frame
    pub x: f64,
    /// Vertical position, 0.0 = top edge of the frame
    pub y: f64,
    /// Relative depth
    pub z: f64,
}

impl Landmark {
    /// Create a new landmark
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Immutable set of landmarks for one detected face
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    /// Wrap a list of points
    #[must_use]
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// Number of points in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the set holds no points
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at `index`, if present
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    /// All points in index order
    #[must_use]
    pub fn points(&self) -> &[Landmark] {
        &self.points
    }
}

/// Outcome of one acquisition attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Acquisition {
    /// A face was detected in the frame
    Face(LandmarkSet),
    /// Frame was read but contained no face
    NoFace,
    /// Source is exhausted, the worker should stop
    EndOfStream,
}

/// Supplier of landmark sets, one per sampled frame.
///
/// `acquire` may block on I/O. An `Err` is a transient failure: the worker
/// logs it and moves on to the next frame.
pub trait LandmarkSource: Send {
    /// Read the next frame
    fn acquire(&mut self) -> Result<Acquisition>;

    /// Human readable source name for logs
    fn name(&self) -> &str;
}

/// In-memory source that plays back a fixed list of acquisitions
pub struct MemorySource {
    frames: VecDeque<Acquisition>,
}

impl MemorySource {
    /// Create a source yielding `frames` in order, then `EndOfStream`
    #[must_use]
    pub fn new(frames: Vec<Acquisition>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl LandmarkSource for MemorySource {
    fn acquire(&mut self) -> Result<Acquisition> {
        Ok(self.frames.pop_front().unwrap_or(Acquisition::EndOfStream))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Builds a full face-mesh landmark set whose derived signals are known.
///
/// Every point sits at the frame center except the ones the geometry
/// extractor reads, which are placed so that the extracted signals equal
/// the builder's fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticFace {
    /// Nose tip position
    pub nose: (f64, f64),
    /// Vertical lid gap of the left eye
    pub left_eye_openness: f64,
    /// Vertical lid gap of the right eye
    pub right_eye_openness: f64,
    /// Vertical lip gap
    pub mouth_opening: f64,
    /// Horizontal distance between the mouth corners
    pub mouth_width: f64,
    /// Horizontal distance between the face edges
    pub face_width: f64,
}

impl Default for SyntheticFace {
    fn default() -> Self {
        Self {
            nose: (0.5, 0.5),
            left_eye_openness: 0.03,
            right_eye_openness: 0.03,
            mouth_opening: 0.0,
            mouth_width: 0.1,
            face_width: 0.4,
        }
    }
}

impl SyntheticFace {
    /// Same face with the nose moved
    #[must_use]
    pub const fn with_nose(mut self, x: f64, y: f64) -> Self {
        self.nose = (x, y);
        self
    }

    /// Same face with both eye gaps set
    #[must_use]
    pub const fn with_eyes(mut self, left: f64, right: f64) -> Self {
        self.left_eye_openness = left;
        self.right_eye_openness = right;
        self
    }

    /// Same face with the lip gap set
    #[must_use]
    pub const fn with_mouth_opening(mut self, opening: f64) -> Self {
        self.mouth_opening = opening;
        self
    }

    /// Produce the landmark set
    #[must_use]
    pub fn build(&self) -> LandmarkSet {
        use crate::constants::{
            FACE_LEFT, FACE_RIGHT, LEFT_EYE_BOTTOM, LEFT_EYE_TOP, LOWER_LIP, MOUTH_LEFT,
            MOUTH_RIGHT, NOSE_TIP, RIGHT_EYE_BOTTOM, RIGHT_EYE_TOP, UPPER_LIP,
        };

        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); NUM_REFINED_FACE_MESH_LANDMARKS];

        points[NOSE_TIP] = Landmark::new(self.nose.0, self.nose.1, 0.0);

        points[FACE_LEFT].x = 0.5 - self.face_width / 2.0;
        points[FACE_RIGHT].x = 0.5 + self.face_width / 2.0;

        points[LEFT_EYE_TOP].y = 0.4;
        points[LEFT_EYE_BOTTOM].y = 0.4 + self.left_eye_openness;
        points[RIGHT_EYE_TOP].y = 0.4;
        points[RIGHT_EYE_BOTTOM].y = 0.4 + self.right_eye_openness;

        points[MOUTH_LEFT].x = 0.5 - self.mouth_width / 2.0;
        points[MOUTH_RIGHT].x = 0.5 + self.mouth_width / 2.0;
        points[UPPER_LIP].y = 0.7;
        points[LOWER_LIP].y = 0.7 + self.mouth_opening;

        LandmarkSet::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_ends_with_end_of_stream() {
        let face = SyntheticFace::default().build();
        let mut source = MemorySource::new(vec![Acquisition::Face(face.clone()), Acquisition::NoFace]);

        assert_eq!(source.acquire().unwrap(), Acquisition::Face(face));
        assert_eq!(source.acquire().unwrap(), Acquisition::NoFace);
        assert_eq!(source.acquire().unwrap(), Acquisition::EndOfStream);
        assert_eq!(source.acquire().unwrap(), Acquisition::EndOfStream);
    }

    #[test]
    fn test_synthetic_face_has_full_topology() {
        let set = SyntheticFace::default().build();
        assert_eq!(set.len(), NUM_REFINED_FACE_MESH_LANDMARKS);
        assert!(!set.is_empty());
        assert_eq!(set.get(1).map(|p| (p.x, p.y)), Some((0.5, 0.5)));
        assert!(set.get(NUM_REFINED_FACE_MESH_LANDMARKS).is_none());
    }
}

//! Head-nod scrolling.
//!
//! Compares each frame's nose height with the previous one. A drop larger
//! than the nod threshold scrolls down, a rise scrolls up. There is a single
//! threshold and no hysteresis band, so oscillation right at the threshold
//! produces alternating scrolls.

use crate::{actions::Action, thresholds::Thresholds};
use log::debug;

/// Last scroll direction, kept for status display only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// Nod detector state
#[derive(Debug, Default)]
pub struct NodScrollDetector {
    previous_nose_y: Option<f64>,
    direction: Option<ScrollDirection>,
}

impl NodScrollDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed this frame's nose height
    pub fn update(&mut self, nose_y: f64, thresholds: &Thresholds) -> Option<Action> {
        let action = self.previous_nose_y.and_then(|previous| {
            let delta = nose_y - previous;
            if delta > thresholds.nod_threshold {
                self.direction = Some(ScrollDirection::Down);
                Some(Action::ScrollDown(thresholds.scroll_amount))
            } else if delta < -thresholds.nod_threshold {
                self.direction = Some(ScrollDirection::Up);
                Some(Action::ScrollUp(thresholds.scroll_amount))
            } else {
                None
            }
        });

        if let Some(action) = action {
            debug!("Nod detected: {action}");
        }

        self.previous_nose_y = Some(nose_y);
        action
    }

    /// Direction of the most recent scroll
    #[must_use]
    pub const fn direction(&self) -> Option<ScrollDirection> {
        self.direction
    }

    /// Forget the previous reading and direction
    pub fn reset(&mut self) {
        self.previous_nose_y = None;
        self.direction = None;
    }
}

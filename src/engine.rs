//! Per-frame gesture evaluation.
//!
//! The engine owns the four gesture machines and runs them in a fixed order
//! on every frame: cursor, nod scroll, blink/click/drag, mouth toggle. It is
//! the unit guarded by the frame lock, so a status read never sees a
//! half-evaluated frame.

use crate::{
    actions::Action,
    blink_click::{BlinkClickMachine, BlinkState},
    cursor_mapper::{CursorMapper, ScreenSize},
    geometry,
    keyboard::KeyboardHandle,
    landmarks::LandmarkSet,
    mouth_toggle::MouthToggleMachine,
    nod_scroll::{NodScrollDetector, ScrollDirection},
    thresholds::Thresholds,
};
use log::{debug, info, warn};
use std::fmt;

/// Snapshot of the engine after the last evaluated frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineStatus {
    /// A face was present in the last frame
    pub face_present: bool,
    /// The last landmark set could not be used
    pub degraded: bool,
    /// Direction of the most recent nod scroll
    pub scroll_direction: Option<ScrollDirection>,
    /// Left button held by a wink drag
    pub dragging: bool,
    /// Current closed-eyes dwell, once it reaches `blink_duration` and
    /// until it would right-click
    pub hold_for_right_click: Option<f64>,
    /// Closing the mouth will toggle the keyboard
    pub mouth_armed: bool,
    /// On-screen keyboard shown
    pub keyboard_open: bool,
    /// Frames evaluated so far
    pub frames: u64,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.face_present {
            return write!(f, "no face (frame {})", self.frames);
        }
        if self.degraded {
            return write!(f, "degraded landmarks (frame {})", self.frames);
        }

        write!(f, "frame {}", self.frames)?;
        if let Some(direction) = self.scroll_direction {
            write!(f, ", scroll {}", direction.as_str())?;
        }
        if self.dragging {
            write!(f, ", dragging")?;
        }
        if let Some(held) = self.hold_for_right_click {
            write!(f, ", hold for right click ({held:.1}s)")?;
        }
        if self.mouth_armed {
            write!(f, ", mouth armed")?;
        }
        if self.keyboard_open {
            write!(f, ", keyboard open")?;
        }
        Ok(())
    }
}

/// Runs the gesture machines over a stream of landmark sets
pub struct GestureEngine {
    cursor: CursorMapper,
    nod: NodScrollDetector,
    blink: BlinkClickMachine,
    mouth: MouthToggleMachine,
    status: EngineStatus,
}

impl GestureEngine {
    #[must_use]
    pub fn new(screen: ScreenSize, keyboard: KeyboardHandle) -> Self {
        Self::with_cursor_mapper(CursorMapper::new(screen), keyboard)
    }

    /// Engine around a preconfigured cursor mapper
    #[must_use]
    pub fn with_cursor_mapper(cursor: CursorMapper, keyboard: KeyboardHandle) -> Self {
        let mouth = MouthToggleMachine::new(keyboard);
        let status = EngineStatus {
            keyboard_open: mouth.keyboard_open(),
            ..EngineStatus::default()
        };

        Self {
            cursor,
            nod: NodScrollDetector::new(),
            blink: BlinkClickMachine::new(),
            mouth,
            status,
        }
    }

    /// Evaluate one frame.
    ///
    /// `None` means no face was detected; nothing runs and no timer moves.
    /// A landmark set that cannot be measured marks the frame degraded.
    pub fn process(
        &mut self,
        landmarks: Option<&LandmarkSet>,
        thresholds: &Thresholds,
        now: f64,
    ) -> Vec<Action> {
        self.status.frames += 1;

        let Some(landmarks) = landmarks else {
            self.status.face_present = false;
            self.status.degraded = false;
            return Vec::new();
        };
        self.status.face_present = true;

        let signals = match geometry::extract(landmarks) {
            Ok(signals) => signals,
            Err(e) => {
                warn!("Skipping frame {}: {e}", self.status.frames);
                self.status.degraded = true;
                return Vec::new();
            }
        };
        self.status.degraded = false;
        debug!(
            "nose=({:.3}, {:.3}) eyes=({:.4}, {:.4}) mar={:.3} face_width={:.3}",
            signals.nose_x,
            signals.nose_y,
            signals.left_eye_openness,
            signals.right_eye_openness,
            signals.mouth_aspect_ratio,
            signals.face_width
        );

        let mut actions = Vec::new();

        match self.cursor.update(&signals, thresholds) {
            Ok(action) => actions.push(action),
            Err(e) => {
                warn!("{e}; resetting");
                self.cursor.reset();
            }
        }

        actions.extend(self.nod.update(signals.nose_y, thresholds));
        actions.extend(
            self.blink
                .update(&signals, thresholds, now, self.cursor.last_position()),
        );
        actions.extend(self.mouth.update(signals.mouth_aspect_ratio, thresholds, now));

        self.refresh_status(thresholds, now);
        actions
    }

    fn refresh_status(&mut self, thresholds: &Thresholds, now: f64) {
        self.status.scroll_direction = self.nod.direction();
        self.status.dragging = self.blink.is_dragging();
        self.status.hold_for_right_click = self.blink.eyes_closed_for(now).filter(|&held| {
            held >= thresholds.blink_duration && held < thresholds.right_click_duration
        });
        self.status.mouth_armed = self.mouth.is_armed();
        self.status.keyboard_open = self.mouth.keyboard_open();
    }

    /// Reset every machine. Returns `DragEnd` if a drag was active.
    pub fn reset(&mut self) -> Vec<Action> {
        info!("Resetting gesture state");
        self.cursor.reset();
        self.nod.reset();
        self.mouth.reset();
        let released = self.blink.recover();

        let frames = self.status.frames;
        let keyboard_open = self.mouth.keyboard_open();
        self.status = EngineStatus {
            frames,
            keyboard_open,
            ..EngineStatus::default()
        };

        released.into_iter().collect()
    }

    /// Release anything held before the frame loop exits
    pub fn shutdown(&mut self) -> Vec<Action> {
        if self.blink.is_dragging() {
            info!("Releasing drag on shutdown");
            self.reset()
        } else {
            Vec::new()
        }
    }

    /// Status after the last frame
    #[must_use]
    pub fn status(&self) -> &EngineStatus {
        &self.status
    }

    /// Coarse blink machine state
    #[must_use]
    pub fn blink_state(&self) -> BlinkState {
        self.blink.state()
    }

    /// Last cursor target, if any
    #[must_use]
    pub fn cursor_position(&self) -> Option<(i32, i32)> {
        self.cursor.last_position()
    }
}

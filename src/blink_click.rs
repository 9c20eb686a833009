//! Blink clicks, dwell right-clicks and left-wink drags.
//!
//! Each frame both eyes are classified against a dynamic threshold,
//! `blink_threshold * face_width`, so detection does not depend on the
//! distance to the camera. The resulting category selects exactly one
//! branch:
//!
//! | category          | effect                                                  |
//! |-------------------|---------------------------------------------------------|
//! | both closed       | start the closed-eyes timer                             |
//! | both open         | resolve click / right-click, end an active drag         |
//! | left closed only  | time the wink, start a drag once confirmed              |
//! | right closed only | abandon any pending wink                                |
//!
//! A closure of at least `right_click_duration` right-clicks; one shorter
//! than `click_interval` clicks. Anything in between does nothing.
//!
//! A drag is started by holding a left wink for `drag_duration` (the intent
//! window), then a further `drag_confirm_delay` measured from that point.
//! It ends only when both eyes are open again.

use crate::{actions::Action, geometry::Signals, thresholds::Thresholds, Error, Result};
use log::{debug, info, warn};

const MACHINE: &str = "blink/click/drag";

/// Per-frame eye category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeState {
    BothClosed,
    BothOpen,
    /// Left eye closed, right eye open
    LeftWink,
    /// Right eye closed, left eye open
    RightWink,
}

impl EyeState {
    /// Classify both eyes against `blink_threshold * face_width`
    #[must_use]
    pub fn classify(signals: &Signals, thresholds: &Thresholds) -> Self {
        let dynamic_threshold = thresholds.blink_threshold * signals.face_width;
        let left_closed = signals.left_eye_openness < dynamic_threshold;
        let right_closed = signals.right_eye_openness < dynamic_threshold;

        match (left_closed, right_closed) {
            (true, true) => Self::BothClosed,
            (false, false) => Self::BothOpen,
            (true, false) => Self::LeftWink,
            (false, true) => Self::RightWink,
        }
    }
}

/// Coarse machine state, derived from the running timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkState {
    Idle,
    EyesClosedTiming,
    LeftWinkTiming,
    Dragging,
}

/// Blink / click / drag state machine
#[derive(Debug, Default)]
pub struct BlinkClickMachine {
    eyes_closed_since: Option<f64>,
    left_eye_closed_since: Option<f64>,
    drag_attempt_since: Option<f64>,
    dragging: bool,
    drag_start_pos: Option<(i32, i32)>,
}

impl BlinkClickMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one frame.
    ///
    /// `pointer` is the current cursor position, captured as the drag start
    /// position. Internal faults are handled here: every timer is cleared
    /// and an active drag is released, so the returned list then holds at
    /// most a `DragEnd`.
    pub fn update(
        &mut self,
        signals: &Signals,
        thresholds: &Thresholds,
        now: f64,
        pointer: Option<(i32, i32)>,
    ) -> Vec<Action> {
        match self.evaluate(signals, thresholds, now, pointer) {
            Ok(actions) => actions,
            Err(e) => {
                warn!("{e}; resetting");
                self.recover().into_iter().collect()
            }
        }
    }

    fn evaluate(
        &mut self,
        signals: &Signals,
        thresholds: &Thresholds,
        now: f64,
        pointer: Option<(i32, i32)>,
    ) -> Result<Vec<Action>> {
        self.check_inputs(signals, now)?;

        let mut actions = Vec::new();
        match EyeState::classify(signals, thresholds) {
            EyeState::BothClosed => {
                if self.eyes_closed_since.is_none() {
                    debug!("Both eyes closed at {now:.3}s");
                    self.eyes_closed_since = Some(now);
                }
            }
            EyeState::BothOpen => {
                if let Some(since) = self.eyes_closed_since.take() {
                    let elapsed = now - since;
                    if elapsed >= thresholds.right_click_duration {
                        info!("Right click triggered ({elapsed:.2}s)");
                        actions.push(Action::RightClick);
                    } else if elapsed < thresholds.click_interval {
                        info!("Left click triggered ({elapsed:.2}s)");
                        actions.push(Action::Click);
                    } else {
                        debug!("Blink of {elapsed:.2}s ignored");
                    }
                }

                // A pending wink timer survives reopening; only a drag clears it
                if self.dragging {
                    info!("Stopped dragging");
                    self.dragging = false;
                    self.drag_start_pos = None;
                    self.left_eye_closed_since = None;
                    self.drag_attempt_since = None;
                    actions.push(Action::DragEnd);
                }
            }
            EyeState::LeftWink => {
                let since = *self.left_eye_closed_since.get_or_insert(now);
                if now - since >= thresholds.drag_duration {
                    let attempt = *self.drag_attempt_since.get_or_insert(now);
                    if !self.dragging && now - attempt >= thresholds.drag_confirm_delay {
                        info!("Started dragging");
                        self.dragging = true;
                        self.drag_start_pos = pointer;
                        actions.push(Action::DragStart);
                    }
                }
            }
            EyeState::RightWink => {
                self.left_eye_closed_since = None;
                self.drag_attempt_since = None;
            }
        }

        Ok(actions)
    }

    fn check_inputs(&self, signals: &Signals, now: f64) -> Result<()> {
        let values = [
            signals.left_eye_openness,
            signals.right_eye_openness,
            signals.face_width,
            now,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::fault(MACHINE, "non-finite eye signal or timestamp"));
        }

        let timers = [
            self.eyes_closed_since,
            self.left_eye_closed_since,
            self.drag_attempt_since,
        ];
        if let Some(since) = timers.into_iter().flatten().find(|&since| now < since) {
            return Err(Error::fault(
                MACHINE,
                format!("clock went backwards ({now:.3}s < {since:.3}s)"),
            ));
        }

        Ok(())
    }

    /// Clear every timer. Returns `DragEnd` if a drag was active.
    pub fn recover(&mut self) -> Option<Action> {
        let was_dragging = self.dragging;
        *self = Self::default();

        if was_dragging {
            warn!("Releasing active drag");
            Some(Action::DragEnd)
        } else {
            None
        }
    }

    /// Current coarse state
    #[must_use]
    pub fn state(&self) -> BlinkState {
        if self.dragging {
            BlinkState::Dragging
        } else if self.eyes_closed_since.is_some() {
            BlinkState::EyesClosedTiming
        } else if self.left_eye_closed_since.is_some() {
            BlinkState::LeftWinkTiming
        } else {
            BlinkState::Idle
        }
    }

    /// True while the left button is held
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Cursor position when the current drag started
    #[must_use]
    pub const fn drag_start_pos(&self) -> Option<(i32, i32)> {
        self.drag_start_pos
    }

    /// How long both eyes have been closed, if they are
    #[must_use]
    pub fn eyes_closed_for(&self, now: f64) -> Option<f64> {
        self.eyes_closed_since.map(|since| (now - since).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN: f64 = 0.03;
    const CLOSED: f64 = 0.005;

    fn eyes(left: f64, right: f64) -> Signals {
        Signals {
            nose_x: 0.5,
            nose_y: 0.5,
            left_eye_openness: left,
            right_eye_openness: right,
            mouth_aspect_ratio: 0.0,
            face_width: 0.4,
        }
    }

    fn thresholds() -> Thresholds {
        Thresholds {
            click_interval: 0.5,
            right_click_duration: 2.0,
            drag_duration: 0.3,
            drag_confirm_delay: 0.3,
            ..Thresholds::default()
        }
    }

    /// Close both eyes at `start`, reopen at `end`, return the actions on reopening
    fn blink(machine: &mut BlinkClickMachine, start: f64, end: f64) -> Vec<Action> {
        let t = thresholds();
        assert!(machine.update(&eyes(CLOSED, CLOSED), &t, start, None).is_empty());
        machine.update(&eyes(OPEN, OPEN), &t, end, None)
    }

    #[test]
    fn test_classification_uses_dynamic_threshold() {
        let t = thresholds();
        // 0.047 * 0.4 = 0.0188
        assert_eq!(EyeState::classify(&eyes(0.018, 0.018), &t), EyeState::BothClosed);
        assert_eq!(EyeState::classify(&eyes(0.019, 0.019), &t), EyeState::BothOpen);
        assert_eq!(EyeState::classify(&eyes(0.018, 0.019), &t), EyeState::LeftWink);
        assert_eq!(EyeState::classify(&eyes(0.019, 0.018), &t), EyeState::RightWink);

        // Same gaps read as open when the face is closer
        let mut near = eyes(0.018, 0.018);
        near.face_width = 0.2;
        assert_eq!(EyeState::classify(&near, &t), EyeState::BothOpen);
    }

    #[test]
    fn test_short_blink_clicks() {
        let mut machine = BlinkClickMachine::new();
        assert_eq!(blink(&mut machine, 1.0, 1.3), vec![Action::Click]);
        assert_eq!(machine.state(), BlinkState::Idle);
    }

    #[test]
    fn test_long_blink_right_clicks() {
        let mut machine = BlinkClickMachine::new();
        assert_eq!(blink(&mut machine, 1.0, 3.5), vec![Action::RightClick]);
    }

    #[test]
    fn test_medium_blink_does_nothing() {
        let mut machine = BlinkClickMachine::new();
        assert!(blink(&mut machine, 1.0, 2.0).is_empty());
        assert_eq!(machine.state(), BlinkState::Idle);
    }

    #[test]
    fn test_right_click_boundary_is_inclusive() {
        let mut machine = BlinkClickMachine::new();
        assert_eq!(blink(&mut machine, 1.0, 3.0), vec![Action::RightClick]);
    }

    #[test]
    fn test_click_boundary_is_exclusive() {
        let mut machine = BlinkClickMachine::new();
        assert!(blink(&mut machine, 1.0, 1.5).is_empty());
    }

    #[test]
    fn test_timer_starts_at_first_closed_frame() {
        let mut machine = BlinkClickMachine::new();
        let t = thresholds();
        machine.update(&eyes(CLOSED, CLOSED), &t, 0.0, None);
        machine.update(&eyes(CLOSED, CLOSED), &t, 1.0, None);
        machine.update(&eyes(CLOSED, CLOSED), &t, 2.0, None);
        assert_eq!(machine.eyes_closed_for(2.0), Some(2.0));
        assert_eq!(machine.state(), BlinkState::EyesClosedTiming);
        assert_eq!(machine.update(&eyes(OPEN, OPEN), &t, 2.1, None), vec![Action::RightClick]);
        assert_eq!(machine.eyes_closed_for(2.1), None);
    }

    #[test]
    fn test_asymmetric_reopening_still_clicks() {
        let mut machine = BlinkClickMachine::new();
        let t = thresholds();
        machine.update(&eyes(CLOSED, CLOSED), &t, 0.0, None);
        // Right eye opens a frame before the left one
        assert!(machine.update(&eyes(CLOSED, OPEN), &t, 0.1, None).is_empty());
        assert_eq!(machine.update(&eyes(OPEN, OPEN), &t, 0.2, None), vec![Action::Click]);
    }

    #[test]
    fn test_left_wink_starts_and_reopening_ends_drag() {
        let mut machine = BlinkClickMachine::new();
        let t = thresholds();

        let mut starts = 0;
        for i in 0..=18 {
            let now = f64::from(i) * 0.05;
            let actions = machine.update(&eyes(CLOSED, OPEN), &t, now, Some((300, 400)));
            starts += actions.iter().filter(|a| **a == Action::DragStart).count();
        }
        assert_eq!(starts, 1);
        assert!(machine.is_dragging());
        assert_eq!(machine.state(), BlinkState::Dragging);
        assert_eq!(machine.drag_start_pos(), Some((300, 400)));

        assert_eq!(machine.update(&eyes(OPEN, OPEN), &t, 1.0, None), vec![Action::DragEnd]);
        assert!(!machine.is_dragging());
        assert_eq!(machine.drag_start_pos(), None);
    }

    #[test]
    fn test_drag_needs_intent_window_plus_confirmation() {
        let mut machine = BlinkClickMachine::new();
        let t = thresholds();

        assert!(machine.update(&eyes(CLOSED, OPEN), &t, 0.0, None).is_empty());
        // Intent window reached, confirmation delay starts now
        assert!(machine.update(&eyes(CLOSED, OPEN), &t, 0.5, None).is_empty());
        assert!(machine.update(&eyes(CLOSED, OPEN), &t, 0.75, None).is_empty());
        assert_eq!(machine.update(&eyes(CLOSED, OPEN), &t, 0.8, None), vec![Action::DragStart]);
    }

    #[test]
    fn test_wink_timer_survives_reopening_without_drag() {
        let mut machine = BlinkClickMachine::new();
        let t = thresholds();

        machine.update(&eyes(CLOSED, OPEN), &t, 0.0, None);
        machine.update(&eyes(CLOSED, OPEN), &t, 0.2, None);
        assert!(machine.update(&eyes(OPEN, OPEN), &t, 0.25, None).is_empty());
        assert_eq!(machine.state(), BlinkState::LeftWinkTiming);

        // Timing continues from the first wink at 0.0: attempt at 0.35, drag at 0.65
        let mut started_at = None;
        for i in 0..=8 {
            let now = 0.35 + f64::from(i) * 0.05;
            if machine.update(&eyes(CLOSED, OPEN), &t, now, None).contains(&Action::DragStart) {
                started_at.get_or_insert(now);
            }
        }
        let started_at = started_at.unwrap();
        assert!((started_at - 0.65).abs() < 1e-9, "drag started at {started_at}");
    }

    #[test]
    fn test_both_closed_leaves_wink_timer_alone() {
        let mut machine = BlinkClickMachine::new();
        let t = thresholds();

        machine.update(&eyes(CLOSED, OPEN), &t, 0.0, None);
        machine.update(&eyes(CLOSED, CLOSED), &t, 0.1, None);
        assert_eq!(machine.state(), BlinkState::EyesClosedTiming);
        assert_eq!(machine.update(&eyes(OPEN, OPEN), &t, 0.2, None), vec![Action::Click]);

        // 0.3s after the wink began the attempt starts, 0.3s later the drag
        assert!(machine.update(&eyes(CLOSED, OPEN), &t, 0.3, None).is_empty());
        assert_eq!(machine.update(&eyes(CLOSED, OPEN), &t, 0.6, None), vec![Action::DragStart]);
    }

    #[test]
    fn test_right_wink_abandons_pending_drag() {
        let mut machine = BlinkClickMachine::new();
        let t = thresholds();

        machine.update(&eyes(CLOSED, OPEN), &t, 0.0, None);
        machine.update(&eyes(CLOSED, OPEN), &t, 0.25, None);
        assert_eq!(machine.state(), BlinkState::LeftWinkTiming);

        assert!(machine.update(&eyes(OPEN, CLOSED), &t, 0.3, None).is_empty());
        assert_eq!(machine.state(), BlinkState::Idle);

        // Wink timing restarts from scratch
        assert!(machine.update(&eyes(CLOSED, OPEN), &t, 0.4, None).is_empty());
        assert!(machine.update(&eyes(CLOSED, OPEN), &t, 0.8, None).is_empty());
    }

    #[test]
    fn test_right_wink_does_not_end_drag() {
        let mut machine = BlinkClickMachine::new();
        let t = thresholds();
        machine.update(&eyes(CLOSED, OPEN), &t, 0.0, None);
        machine.update(&eyes(CLOSED, OPEN), &t, 0.3, None);
        assert_eq!(machine.update(&eyes(CLOSED, OPEN), &t, 0.6, None), vec![Action::DragStart]);

        assert!(machine.update(&eyes(OPEN, CLOSED), &t, 0.7, None).is_empty());
        assert!(machine.is_dragging());
    }

    #[test]
    fn test_blink_while_dragging_clicks_then_ends_drag() {
        let mut machine = BlinkClickMachine::new();
        let t = thresholds();
        machine.update(&eyes(CLOSED, OPEN), &t, 0.0, None);
        machine.update(&eyes(CLOSED, OPEN), &t, 0.3, None);
        machine.update(&eyes(CLOSED, OPEN), &t, 0.6, None);

        machine.update(&eyes(CLOSED, CLOSED), &t, 0.7, None);
        assert_eq!(
            machine.update(&eyes(OPEN, OPEN), &t, 0.9, None),
            vec![Action::Click, Action::DragEnd]
        );
    }

    #[test]
    fn test_fault_while_dragging_releases_drag() {
        let mut machine = BlinkClickMachine::new();
        let t = thresholds();
        machine.update(&eyes(CLOSED, OPEN), &t, 0.0, None);
        machine.update(&eyes(CLOSED, OPEN), &t, 0.3, None);
        machine.update(&eyes(CLOSED, OPEN), &t, 0.6, None);
        assert!(machine.is_dragging());

        let actions = machine.update(&eyes(f64::NAN, OPEN), &t, 0.7, None);
        assert_eq!(actions, vec![Action::DragEnd]);
        assert_eq!(machine.state(), BlinkState::Idle);
        assert_eq!(machine.eyes_closed_for(0.7), None);
    }

    #[test]
    fn test_clock_regression_is_a_fault() {
        let mut machine = BlinkClickMachine::new();
        let t = thresholds();
        machine.update(&eyes(CLOSED, CLOSED), &t, 5.0, None);
        assert!(machine.update(&eyes(OPEN, OPEN), &t, 4.0, None).is_empty());
        assert_eq!(machine.state(), BlinkState::Idle);
    }

    #[test]
    fn test_recover_when_idle_emits_nothing() {
        let mut machine = BlinkClickMachine::new();
        assert_eq!(machine.recover(), None);
    }
}

//! Open-mouth keyboard toggle.
//!
//! Holding the mouth open (MAR above `mouth_open_threshold`) for longer than
//! `mouth_open_duration` arms the machine. Closing it afterwards toggles the
//! on-screen keyboard once. Arming is sticky: dips in MAR that stay above
//! the threshold do not disarm it.

use crate::{
    actions::Action,
    keyboard::KeyboardHandle,
    thresholds::Thresholds,
    Error, Result,
};
use log::{debug, info, warn};

const MACHINE: &str = "mouth toggle";

/// Mouth toggle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouthState {
    Closed,
    OpenTiming,
    ArmedWaitingForClose,
}

/// Mouth toggle machine, bound to a shared keyboard
pub struct MouthToggleMachine {
    keyboard: KeyboardHandle,
    state: MouthState,
    mouth_open_since: Option<f64>,
}

impl MouthToggleMachine {
    #[must_use]
    pub fn new(keyboard: KeyboardHandle) -> Self {
        Self {
            keyboard,
            state: MouthState::Closed,
            mouth_open_since: None,
        }
    }

    /// Evaluate one frame's mouth aspect ratio.
    /// Faults reset the machine to `Closed` and produce nothing.
    pub fn update(&mut self, mar: f64, thresholds: &Thresholds, now: f64) -> Option<Action> {
        match self.evaluate(mar, thresholds, now) {
            Ok(action) => action,
            Err(e) => {
                warn!("{e}; resetting");
                self.reset();
                None
            }
        }
    }

    fn evaluate(&mut self, mar: f64, thresholds: &Thresholds, now: f64) -> Result<Option<Action>> {
        if !mar.is_finite() || !now.is_finite() {
            return Err(Error::fault(MACHINE, "non-finite mouth ratio or timestamp"));
        }
        if let Some(since) = self.mouth_open_since.filter(|&since| now < since) {
            return Err(Error::fault(
                MACHINE,
                format!("clock went backwards ({now:.3}s < {since:.3}s)"),
            ));
        }

        if mar > thresholds.mouth_open_threshold {
            match self.mouth_open_since {
                None => {
                    debug!("Mouth opened at {now:.3}s (MAR {mar:.2})");
                    self.mouth_open_since = Some(now);
                    if self.state == MouthState::Closed {
                        self.state = MouthState::OpenTiming;
                    }
                }
                Some(since) => {
                    if self.state == MouthState::OpenTiming
                        && now - since > thresholds.mouth_open_duration
                    {
                        debug!("Mouth toggle armed");
                        self.state = MouthState::ArmedWaitingForClose;
                    }
                }
            }
            return Ok(None);
        }

        self.mouth_open_since = None;
        if self.state != MouthState::ArmedWaitingForClose {
            self.state = MouthState::Closed;
            return Ok(None);
        }

        self.toggle_keyboard()?;
        self.state = MouthState::Closed;
        Ok(Some(Action::ToggleKeyboard))
    }

    fn toggle_keyboard(&self) -> Result<()> {
        let mut keyboard = self
            .keyboard
            .lock()
            .map_err(|_| Error::LockPoisoned("keyboard"))?;

        keyboard.refresh();
        if keyboard.is_open() {
            keyboard.close()?;
            info!("Keyboard toggled off");
        } else {
            keyboard.open()?;
            info!("Keyboard toggled on");
        }
        Ok(())
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> MouthState {
        self.state
    }

    /// True once the hold is long enough and closing will toggle
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state == MouthState::ArmedWaitingForClose
    }

    /// Whether the shared keyboard is currently shown
    #[must_use]
    pub fn keyboard_open(&self) -> bool {
        self.keyboard
            .lock()
            .map(|mut k| {
                k.refresh();
                k.is_open()
            })
            .unwrap_or(false)
    }

    /// Back to `Closed` with no timer running
    pub fn reset(&mut self) {
        self.state = MouthState::Closed;
        self.mouth_open_since = None;
    }
}

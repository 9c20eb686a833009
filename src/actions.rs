//! Control actions emitted by the gesture machines and the sink contract
//! that executes them.

use crate::{Error, Result};
use log::info;
use std::{
    fmt,
    sync::{Arc, Mutex},
};

/// One discrete control event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Move the pointer to an absolute screen position
    MoveCursor { x: i32, y: i32 },
    /// Left click
    Click,
    /// Right click
    RightClick,
    /// Press and hold the left button
    DragStart,
    /// Release the left button
    DragEnd,
    /// Scroll up by the given wheel units
    ScrollUp(u32),
    /// Scroll down by the given wheel units
    ScrollDown(u32),
    /// Open or close the on-screen keyboard
    ToggleKeyboard,
}

impl Action {
    /// True for everything except pointer motion
    #[must_use]
    pub const fn is_discrete(&self) -> bool {
        !matches!(self, Self::MoveCursor { .. })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MoveCursor { x, y } => write!(f, "move({x}, {y})"),
            Self::Click => f.write_str("click"),
            Self::RightClick => f.write_str("right-click"),
            Self::DragStart => f.write_str("drag-start"),
            Self::DragEnd => f.write_str("drag-end"),
            Self::ScrollUp(amount) => write!(f, "scroll-up({amount})"),
            Self::ScrollDown(amount) => write!(f, "scroll-down({amount})"),
            Self::ToggleKeyboard => f.write_str("toggle-keyboard"),
        }
    }
}

/// Executes actions against the OS or UI.
///
/// Pointer moves and scrolls may be repeated with the same value without
/// harm; clicks and drag edges are one-shot.
pub trait ActionSink: Send {
    /// Move the pointer
    fn move_cursor(&mut self, x: i32, y: i32) -> Result<()>;
    /// Left click at the current position
    fn click(&mut self) -> Result<()>;
    /// Right click at the current position
    fn right_click(&mut self) -> Result<()>;
    /// Press the left button
    fn drag_start(&mut self) -> Result<()>;
    /// Release the left button
    fn drag_end(&mut self) -> Result<()>;
    /// Scroll up
    fn scroll_up(&mut self, amount: u32) -> Result<()>;
    /// Scroll down
    fn scroll_down(&mut self, amount: u32) -> Result<()>;
    /// The keyboard was toggled by the mouth gesture
    fn toggle_keyboard(&mut self) -> Result<()>;

    /// Route an action to its method
    fn dispatch(&mut self, action: &Action) -> Result<()> {
        match *action {
            Action::MoveCursor { x, y } => self.move_cursor(x, y),
            Action::Click => self.click(),
            Action::RightClick => self.right_click(),
            Action::DragStart => self.drag_start(),
            Action::DragEnd => self.drag_end(),
            Action::ScrollUp(amount) => self.scroll_up(amount),
            Action::ScrollDown(amount) => self.scroll_down(amount),
            Action::ToggleKeyboard => self.toggle_keyboard(),
        }
    }
}

/// Sink that only logs, for dry runs
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    fn log(action: Action) -> Result<()> {
        if action.is_discrete() {
            info!("Action: {action}");
        } else {
            log::trace!("Action: {action}");
        }
        Ok(())
    }
}

impl ActionSink for LogSink {
    fn move_cursor(&mut self, x: i32, y: i32) -> Result<()> {
        Self::log(Action::MoveCursor { x, y })
    }

    fn click(&mut self) -> Result<()> {
        Self::log(Action::Click)
    }

    fn right_click(&mut self) -> Result<()> {
        Self::log(Action::RightClick)
    }

    fn drag_start(&mut self) -> Result<()> {
        Self::log(Action::DragStart)
    }

    fn drag_end(&mut self) -> Result<()> {
        Self::log(Action::DragEnd)
    }

    fn scroll_up(&mut self, amount: u32) -> Result<()> {
        Self::log(Action::ScrollUp(amount))
    }

    fn scroll_down(&mut self, amount: u32) -> Result<()> {
        Self::log(Action::ScrollDown(amount))
    }

    fn toggle_keyboard(&mut self) -> Result<()> {
        Self::log(Action::ToggleKeyboard)
    }
}

/// Sink that records every action into a shared list
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    actions: Arc<Mutex<Vec<Action>>>,
}

impl RecordingSink {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far
    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Recorded actions other than pointer moves
    pub fn discrete_actions(&self) -> Vec<Action> {
        self.actions().into_iter().filter(Action::is_discrete).collect()
    }

    fn record(&self, action: Action) -> Result<()> {
        self.actions
            .lock()
            .map_err(|_| Error::LockPoisoned("recording sink"))?
            .push(action);
        Ok(())
    }
}

impl ActionSink for RecordingSink {
    fn move_cursor(&mut self, x: i32, y: i32) -> Result<()> {
        self.record(Action::MoveCursor { x, y })
    }

    fn click(&mut self) -> Result<()> {
        self.record(Action::Click)
    }

    fn right_click(&mut self) -> Result<()> {
        self.record(Action::RightClick)
    }

    fn drag_start(&mut self) -> Result<()> {
        self.record(Action::DragStart)
    }

    fn drag_end(&mut self) -> Result<()> {
        self.record(Action::DragEnd)
    }

    fn scroll_up(&mut self, amount: u32) -> Result<()> {
        self.record(Action::ScrollUp(amount))
    }

    fn scroll_down(&mut self, amount: u32) -> Result<()> {
        self.record(Action::ScrollDown(amount))
    }

    fn toggle_keyboard(&mut self) -> Result<()> {
        self.record(Action::ToggleKeyboard)
    }
}

//! X11 action sink.
//!
//! Moves the pointer with `WarpPointer` and injects button presses through
//! the XTEST extension, so clicks, drags and wheel scrolling reach whatever
//! window is under the cursor.

use crate::{
    actions::ActionSink,
    constants::SCROLL_UNITS_PER_NOTCH,
    cursor_mapper::ScreenSize,
    Error, Result,
};
use log::{debug, info, warn};
use x11rb::{
    connection::Connection,
    protocol::{
        xproto::{ConnectionExt as _, Window, BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT},
        xtest::ConnectionExt as _,
    },
    rust_connection::RustConnection,
};

/// Core protocol button numbers
const BUTTON_LEFT: u8 = 1;
const BUTTON_RIGHT: u8 = 3;
const BUTTON_WHEEL_UP: u8 = 4;
const BUTTON_WHEEL_DOWN: u8 = 5;

fn x11_error(context: &str, e: impl std::fmt::Display) -> Error {
    Error::CursorControl(format!("{context}: {e}"))
}

/// Pointer warping and button injection on the default X11 screen
pub struct CursorController {
    connection: RustConnection,
    root: Window,
    size: (u16, u16),
    button_held: bool,
}

impl CursorController {
    /// Connect to the display named by `$DISPLAY` and check for XTEST
    pub fn new() -> Result<Self> {
        let (connection, screen_num) =
            RustConnection::connect(None).map_err(|e| Error::X11(format!("Failed to connect to X11: {e}")))?;

        let screen = connection
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| Error::X11(format!("Screen {screen_num} not found")))?;
        let root = screen.root;
        let size = (screen.width_in_pixels, screen.height_in_pixels);

        let version = connection
            .xtest_get_version(2, 2)
            .map_err(|e| Error::X11(format!("Failed to query XTEST: {e}")))?
            .reply()
            .map_err(|e| Error::X11(format!("XTEST extension unavailable: {e}")))?;

        info!(
            "Connected to X11 screen {}x{} (XTEST {}.{})",
            size.0, size.1, version.major_version, version.minor_version
        );

        Ok(Self {
            connection,
            root,
            size,
            button_held: false,
        })
    }

    /// Size of the root window
    #[must_use]
    pub fn screen_size(&self) -> ScreenSize {
        ScreenSize::new(u32::from(self.size.0), u32::from(self.size.1))
    }

    /// Warp the pointer, clamped onto the root window
    fn warp(&self, x: i32, y: i32) -> Result<()> {
        let x = on_axis(x, self.size.0);
        let y = on_axis(y, self.size.1);
        debug!("Warping pointer to ({x}, {y})");

        self.connection
            .warp_pointer(x11rb::NONE, self.root, 0, 0, 0, 0, x, y)
            .map_err(|e| x11_error("Failed to warp pointer", e))?;
        self.flush()
    }

    fn fake_button(&self, event: u8, button: u8) -> Result<()> {
        self.connection
            .xtest_fake_input(event, button, x11rb::CURRENT_TIME, self.root, 0, 0, 0)
            .map_err(|e| x11_error(&format!("Failed to inject button {button}"), e))?;
        Ok(())
    }

    fn press(&self, button: u8) -> Result<()> {
        self.fake_button(BUTTON_PRESS_EVENT, button)?;
        self.flush()
    }

    fn release(&self, button: u8) -> Result<()> {
        self.fake_button(BUTTON_RELEASE_EVENT, button)?;
        self.flush()
    }

    /// Press and release `button` `times` times, flushing once
    fn tap(&self, button: u8, times: u32) -> Result<()> {
        for _ in 0..times {
            self.fake_button(BUTTON_PRESS_EVENT, button)?;
            self.fake_button(BUTTON_RELEASE_EVENT, button)?;
        }
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        self.connection
            .flush()
            .map_err(|e| x11_error("Failed to flush connection", e))
    }
}

/// Clamp a coordinate into `[0, extent)` and the protocol's `i16` range
fn on_axis(value: i32, extent: u16) -> i16 {
    let max = i32::from(extent.saturating_sub(1)).min(i32::from(i16::MAX));
    i16::try_from(value.clamp(0, max)).unwrap_or(i16::MAX)
}

/// Wheel clicks for a scroll amount, at least one
#[must_use]
pub fn wheel_notches(amount: u32) -> u32 {
    (amount / SCROLL_UNITS_PER_NOTCH).max(1)
}

impl ActionSink for CursorController {
    fn move_cursor(&mut self, x: i32, y: i32) -> Result<()> {
        self.warp(x, y)
    }

    fn click(&mut self) -> Result<()> {
        self.tap(BUTTON_LEFT, 1)
    }

    fn right_click(&mut self) -> Result<()> {
        self.tap(BUTTON_RIGHT, 1)
    }

    fn drag_start(&mut self) -> Result<()> {
        if !self.button_held {
            self.press(BUTTON_LEFT)?;
            self.button_held = true;
        }
        Ok(())
    }

    fn drag_end(&mut self) -> Result<()> {
        // Released even when not held so a press from elsewhere never sticks
        self.release(BUTTON_LEFT)?;
        self.button_held = false;
        Ok(())
    }

    fn scroll_up(&mut self, amount: u32) -> Result<()> {
        self.tap(BUTTON_WHEEL_UP, wheel_notches(amount))
    }

    fn scroll_down(&mut self, amount: u32) -> Result<()> {
        self.tap(BUTTON_WHEEL_DOWN, wheel_notches(amount))
    }

    fn toggle_keyboard(&mut self) -> Result<()> {
        // The keyboard collaborator already acted
        debug!("Keyboard toggled");
        Ok(())
    }
}

impl Drop for CursorController {
    fn drop(&mut self) {
        if self.button_held {
            if let Err(e) = self.release(BUTTON_LEFT) {
                warn!("Left button may still be held: {e}");
            }
        }
    }
}

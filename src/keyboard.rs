//! On-screen keyboard control.

use crate::{Error, Result};
use log::{debug, info, warn};
use std::{
    process::{Child, Command, Stdio},
    sync::{Arc, Mutex},
};

/// Something that can show and hide an on-screen keyboard
pub trait VirtualKeyboard: Send {
    /// Show the keyboard
    fn open(&mut self) -> Result<()>;

    /// Hide the keyboard
    fn close(&mut self) -> Result<()>;

    /// Whether the keyboard is currently shown
    fn is_open(&self) -> bool;

    /// Pick up visibility changes made outside this process
    fn refresh(&mut self) {}
}

/// Shared keyboard handle, injected into the mouth toggle
pub type KeyboardHandle = Arc<Mutex<dyn VirtualKeyboard>>;

/// Wrap a keyboard in a shared handle
pub fn shared<K: VirtualKeyboard + 'static>(keyboard: K) -> KeyboardHandle {
    Arc::new(Mutex::new(keyboard))
}

/// Runs an external on-screen keyboard program, e.g. `onboard`
pub struct CommandKeyboard {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl CommandKeyboard {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            child: None,
        }
    }

    /// Program that gets launched
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn reap_exited(&mut self) {
        if let Some(child) = self.child.as_mut() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!("{} exited on its own ({status})", self.program);
                    self.child = None;
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to poll {}: {e}", self.program),
            }
        }
    }
}

impl VirtualKeyboard for CommandKeyboard {
    fn open(&mut self) -> Result<()> {
        self.reap_exited();
        if self.child.is_some() {
            return Ok(());
        }

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Keyboard(format!("Failed to launch {}: {e}", self.program)))?;

        info!("Virtual keyboard opened ({}, pid {})", self.program, child.id());
        self.child = Some(child);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.reap_exited();
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        child
            .kill()
            .and_then(|()| child.wait().map(|_| ()))
            .map_err(|e| Error::Keyboard(format!("Failed to stop {}: {e}", self.program)))?;

        info!("Virtual keyboard closed");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.child.is_some()
    }

    fn refresh(&mut self) {
        self.reap_exited();
    }
}

impl Drop for CommandKeyboard {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("{e}");
        }
    }
}

/// Keyboard that only tracks its visibility, for dry runs and tests
#[derive(Debug, Default)]
pub struct NullKeyboard {
    open: bool,
    toggles: usize,
}

impl NullKeyboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open/close calls so far
    #[must_use]
    pub const fn toggles(&self) -> usize {
        self.toggles
    }
}

impl VirtualKeyboard for NullKeyboard {
    fn open(&mut self) -> Result<()> {
        info!("Virtual keyboard opened (dry run)");
        self.open = true;
        self.toggles += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        info!("Virtual keyboard closed (dry run)");
        self.open = false;
        self.toggles += 1;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_keyboard_tracks_visibility() {
        let mut keyboard = NullKeyboard::new();
        assert!(!keyboard.is_open());
        keyboard.open().unwrap();
        assert!(keyboard.is_open());
        keyboard.close().unwrap();
        assert!(!keyboard.is_open());
        assert_eq!(keyboard.toggles(), 2);
    }

    #[test]
    fn test_missing_program_fails_to_open() {
        let mut keyboard = CommandKeyboard::new("/nonexistent/osk-binary", Vec::new());
        let result = keyboard.open();
        assert!(matches!(result, Err(Error::Keyboard(_))));
        assert!(!keyboard.is_open());
    }

    #[cfg(unix)]
    #[test]
    fn test_program_dismissed_by_hand_reads_as_closed() {
        // `true` exits straight away, like a keyboard the user closed
        let mut keyboard = CommandKeyboard::new("true", Vec::new());
        keyboard.open().unwrap();
        for _ in 0..400 {
            keyboard.refresh();
            if !keyboard.is_open() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(!keyboard.is_open());
        assert!(keyboard.close().is_ok());
    }

    #[test]
    fn test_close_without_open_is_noop() {
        let mut keyboard = CommandKeyboard::new("onboard", Vec::new());
        assert!(keyboard.close().is_ok());
        assert_eq!(keyboard.program(), "onboard");
    }
}

//! Error types for the face gesture control library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Recorded landmark file could not be parsed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// `X11` window system operation failed
    #[error("X11 error: {0}")]
    X11(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Landmark set does not contain every index the extractor reads
    #[error("Insufficient landmarks: need at least {required}, got {actual}")]
    InsufficientLandmarks {
        /// Minimum number of points required
        required: usize,
        /// Number of points actually supplied
        actual: usize,
    },

    /// Landmark source could not be opened or read
    #[error("Landmark source error: {0}")]
    LandmarkSource(String),

    /// A gesture state machine hit an inconsistent internal state
    #[error("Gesture fault in {machine}: {reason}")]
    GestureFault {
        /// Name of the machine that faulted
        machine: &'static str,
        /// What went wrong
        reason: String,
    },

    /// Virtual keyboard collaborator failed
    #[error("Keyboard error: {0}")]
    Keyboard(String),

    /// Cursor control operation failed
    #[error("Cursor control error: {0}")]
    CursorControl(String),

    /// Threshold persistence failed
    #[error("Threshold persistence error: {0}")]
    Persistence(String),

    /// Unknown or malformed tuning command
    #[error("Unknown tuning command: {0}")]
    UnknownCommand(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Frame worker thread failed
    #[error("Frame worker error: {0}")]
    Worker(String),

    /// Shared state lock was poisoned by a panicking thread
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl Error {
    /// Shorthand for a [`Error::GestureFault`]
    pub fn fault(machine: &'static str, reason: impl Into<String>) -> Self {
        Self::GestureFault {
            machine,
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

//! Hands-free pointer control from facial landmarks.
//!
//! This library turns a stream of face-mesh landmark sets into pointer
//! actions:
//! - the nose position drives the cursor
//! - head nods scroll
//! - blinks click, long blinks right-click and a held left wink drags
//! - holding the mouth open toggles an on-screen keyboard
//!
//! The processing pipeline consists of:
//! 1. A [`landmarks::LandmarkSource`] producing one landmark set per frame
//! 2. Geometry extraction of the scalar signals the gestures use
//! 3. Four gesture state machines run in a fixed order by the [`engine::GestureEngine`]
//! 4. An [`actions::ActionSink`] executing the resulting actions
//!
//! Thresholds live in a [`thresholds::ThresholdStore`] that can be tuned
//! while the frame worker runs.
//!
//! # Examples
//!
//! ## Evaluating frames
//!
//! ```
//! use face_gesture_control::{
//!     actions::Action,
//!     cursor_mapper::ScreenSize,
//!     engine::GestureEngine,
//!     keyboard::{shared, NullKeyboard},
//!     landmarks::SyntheticFace,
//!     thresholds::Thresholds,
//! };
//!
//! let mut engine = GestureEngine::new(ScreenSize::new(1920, 1080), shared(NullKeyboard::new()));
//! let thresholds = Thresholds::default();
//!
//! let closed = SyntheticFace::default().with_eyes(0.005, 0.005).build();
//! let open = SyntheticFace::default().build();
//!
//! // A short blink is a click
//! engine.process(Some(&closed), &thresholds, 0.0);
//! let actions = engine.process(Some(&open), &thresholds, 0.2);
//! assert!(actions.contains(&Action::Click));
//! ```
//!
//! ## Tuning thresholds
//!
//! ```
//! use face_gesture_control::thresholds::{MemoryPersistence, ThresholdCommand, ThresholdStore};
//!
//! # fn main() -> face_gesture_control::Result<()> {
//! let store = ThresholdStore::open(Box::new(MemoryPersistence::default()));
//! let updated = store.apply("sensitivity+".parse::<ThresholdCommand>()?)?;
//! assert!((updated.sensitivity - 2.8).abs() < 1e-9);
//! # Ok(())
//! # }
//! ```
//!
//! ## Replaying a recording
//!
//! ```no_run
//! use face_gesture_control::{
//!     actions::LogSink,
//!     app::{FrameWorker, WorkerSettings},
//!     cursor_mapper::ScreenSize,
//!     engine::GestureEngine,
//!     keyboard::{shared, NullKeyboard},
//!     replay::ReplaySource,
//!     thresholds::{MemoryPersistence, ThresholdStore},
//!     utils::MonotonicClock,
//! };
//! use std::{
//!     sync::{Arc, Mutex},
//!     time::Duration,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = GestureEngine::new(ScreenSize::new(1920, 1080), shared(NullKeyboard::new()));
//! let store = ThresholdStore::open(Box::new(MemoryPersistence::default()));
//! let settings = WorkerSettings {
//!     frame_skip: 1,
//!     frame_interval: Duration::from_millis(30),
//! };
//!
//! let worker = FrameWorker::new(Arc::new(Mutex::new(engine)), Arc::new(store), settings);
//! let mut source = ReplaySource::open("session.csv")?;
//! let report = worker.run(&mut source, &mut LogSink, &mut MonotonicClock::start())?;
//! println!("{} frames evaluated", report.evaluated);
//! # Ok(())
//! # }
//! ```

/// Facial landmark sets and sources
pub mod landmarks;

/// Scalar signals derived from a landmark set
pub mod geometry;

/// Nose-driven cursor positioning
pub mod cursor_mapper;

/// Head-nod scrolling
pub mod nod_scroll;

/// Blink clicks and wink drags
pub mod blink_click;

/// Mouth-open keyboard toggle
pub mod mouth_toggle;

/// Per-frame orchestration of the gesture machines
pub mod engine;

/// Tunable thresholds, tuning commands and persistence
pub mod thresholds;

/// Actions and the sinks that execute them
pub mod actions;

/// On-screen keyboard collaborator
pub mod keyboard;

/// Recorded landmark input
pub mod replay;

/// Signal filtering algorithms for smoothing cursor targets
pub mod filters;

/// Utility functions for clocks and numeric conversions
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Cursor control module for X11 systems
pub mod cursor_control;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};

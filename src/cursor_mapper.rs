//! Maps the nose position to an absolute screen position.
//!
//! `target = ((nose - 0.5) * sensitivity / movement_range) * dim + dim / 2`,
//! per axis, clamped to `[safe_margin, dim - safe_margin]`. A target is
//! emitted every evaluated frame; there is no dead band.

use crate::{
    actions::Action,
    filters::{smoothing_filter, CursorFilter},
    geometry::Signals,
    thresholds::Thresholds,
    utils::safe_cast::pixel,
    Error, Result,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Screen dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Unclamped target along one axis
#[must_use]
pub fn map_axis(nose: f64, sensitivity: f64, movement_range: f64, dim: f64) -> f64 {
    ((nose - 0.5) * sensitivity / movement_range) * dim + dim / 2.0
}

/// Clamp a target into `[margin, dim - margin]`.
/// A margin wider than half the screen pins the cursor to the center.
#[must_use]
pub fn clamp_axis(value: f64, margin: f64, dim: f64) -> f64 {
    let (low, high) = if 2.0 * margin > dim {
        (dim / 2.0, dim / 2.0)
    } else {
        (margin, dim - margin)
    };
    value.clamp(low, high)
}

/// Cursor mapper with optional smoothing
pub struct CursorMapper {
    screen: ScreenSize,
    filter: Box<dyn CursorFilter>,
    window: usize,
    fixed_filter: bool,
    last_position: Option<(i32, i32)>,
}

impl CursorMapper {
    /// Mapper whose smoothing follows `Thresholds::smoothing_window`
    #[must_use]
    pub fn new(screen: ScreenSize) -> Self {
        Self {
            screen,
            filter: smoothing_filter(1),
            window: 1,
            fixed_filter: false,
            last_position: None,
        }
    }

    /// Mapper with a fixed filter, `smoothing_window` is then ignored
    #[must_use]
    pub fn with_filter(screen: ScreenSize, filter: Box<dyn CursorFilter>) -> Self {
        Self {
            screen,
            filter,
            window: 0,
            fixed_filter: true,
            last_position: None,
        }
    }

    /// Screen the mapper targets
    #[must_use]
    pub const fn screen(&self) -> ScreenSize {
        self.screen
    }

    /// Last position emitted, if any
    #[must_use]
    pub const fn last_position(&self) -> Option<(i32, i32)> {
        self.last_position
    }

    /// Compute this frame's cursor target
    pub fn update(&mut self, signals: &Signals, thresholds: &Thresholds) -> Result<Action> {
        if !self.fixed_filter && thresholds.smoothing_window != self.window {
            debug!("Cursor smoothing window set to {}", thresholds.smoothing_window);
            self.window = thresholds.smoothing_window;
            self.filter = smoothing_filter(self.window);
        }

        let width = f64::from(self.screen.width);
        let height = f64::from(self.screen.height);
        let raw_x = map_axis(signals.nose_x, thresholds.sensitivity, thresholds.movement_range, width);
        let raw_y = map_axis(signals.nose_y, thresholds.sensitivity, thresholds.movement_range, height);

        let (smooth_x, smooth_y) = self.filter.apply(raw_x, raw_y);

        let margin = f64::from(thresholds.safe_margin);
        let x = pixel(clamp_axis(smooth_x, margin, width))
            .map_err(|e| Error::fault("cursor mapper", e.to_string()))?;
        let y = pixel(clamp_axis(smooth_y, margin, height))
            .map_err(|e| Error::fault("cursor mapper", e.to_string()))?;

        self.last_position = Some((x, y));
        Ok(Action::MoveCursor { x, y })
    }

    /// Drop smoothing history and the last position
    pub fn reset(&mut self) {
        self.filter.reset();
        self.last_position = None;
    }
}

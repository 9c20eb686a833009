//! Tunable gesture thresholds, the commands that adjust them, and the store
//! that shares them between the frame worker and the tuning channel.

use crate::{constants::*, Error, Result};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::{Mutex, RwLock},
};

/// Every tunable scalar read by the gesture machines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Cursor gain around the frame center
    pub sensitivity: f64,
    /// Fraction of the frame the nose travels to cover the screen
    pub movement_range: f64,
    /// Minimum per-frame nose_y change that scrolls
    pub nod_threshold: f64,
    /// Eye gap threshold as a fraction of face width
    pub blink_threshold: f64,
    /// Closed-eyes dwell before the right-click countdown is shown (seconds)
    pub blink_duration: f64,
    /// Blinks shorter than this click (seconds, exclusive)
    pub click_interval: f64,
    /// Blinks at least this long right-click (seconds, inclusive)
    pub right_click_duration: f64,
    /// Left wink dwell before a drag attempt begins (seconds)
    pub drag_duration: f64,
    /// Delay from the drag attempt to the drag start (seconds)
    pub drag_confirm_delay: f64,
    /// Mouth aspect ratio above which the mouth counts as open
    pub mouth_open_threshold: f64,
    /// Open-mouth hold required to arm the keyboard toggle (seconds, exclusive)
    pub mouth_open_duration: f64,
    /// Distance kept between the cursor and the screen edges (pixels)
    pub safe_margin: u32,
    /// Wheel units per nod
    pub scroll_amount: u32,
    /// Moving average window over cursor targets, 1 disables smoothing
    pub smoothing_window: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            movement_range: DEFAULT_MOVEMENT_RANGE,
            nod_threshold: DEFAULT_NOD_THRESHOLD,
            blink_threshold: DEFAULT_BLINK_THRESHOLD,
            blink_duration: DEFAULT_BLINK_DURATION,
            click_interval: DEFAULT_CLICK_INTERVAL,
            right_click_duration: DEFAULT_RIGHT_CLICK_DURATION,
            drag_duration: DEFAULT_DRAG_DURATION,
            drag_confirm_delay: DEFAULT_DRAG_CONFIRM_DELAY,
            mouth_open_threshold: DEFAULT_MOUTH_OPEN_THRESHOLD,
            mouth_open_duration: DEFAULT_MOUTH_OPEN_DURATION,
            safe_margin: DEFAULT_SAFE_MARGIN,
            scroll_amount: DEFAULT_SCROLL_AMOUNT,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

impl Thresholds {
    /// Copy with every field forced into the range the tuning commands allow.
    /// Non-finite values fall back to their defaults.
    #[must_use]
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        let floor = |value: f64, default: f64, min: f64| {
            if value.is_finite() {
                value.max(min)
            } else {
                default
            }
        };
        let bounded = |value: f64, default: f64, min: f64, max: f64| {
            if value.is_finite() {
                value.clamp(min, max)
            } else {
                default
            }
        };

        Self {
            sensitivity: floor(self.sensitivity, defaults.sensitivity, 0.1),
            movement_range: floor(self.movement_range, defaults.movement_range, 0.01),
            nod_threshold: floor(self.nod_threshold, defaults.nod_threshold, 0.001),
            blink_threshold: floor(self.blink_threshold, defaults.blink_threshold, 0.001),
            blink_duration: floor(self.blink_duration, defaults.blink_duration, 0.01),
            click_interval: floor(self.click_interval, defaults.click_interval, 0.1),
            right_click_duration: floor(self.right_click_duration, defaults.right_click_duration, 0.1),
            drag_duration: floor(self.drag_duration, defaults.drag_duration, 0.05),
            drag_confirm_delay: floor(self.drag_confirm_delay, defaults.drag_confirm_delay, 0.05),
            mouth_open_threshold: bounded(self.mouth_open_threshold, defaults.mouth_open_threshold, 0.1, 1.0),
            mouth_open_duration: bounded(self.mouth_open_duration, defaults.mouth_open_duration, 0.1, 2.0),
            safe_margin: self.safe_margin.max(1),
            scroll_amount: self.scroll_amount.max(50),
            smoothing_window: self.smoothing_window.clamp(1, MAX_SMOOTHING_WINDOW),
        }
    }
}

/// Discrete threshold adjustment delivered by the tuning channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThresholdCommand {
    IncreaseSensitivity,
    DecreaseSensitivity,
    IncreaseMovementRange,
    DecreaseMovementRange,
    IncreaseNodThreshold,
    DecreaseNodThreshold,
    IncreaseBlinkThreshold,
    DecreaseBlinkThreshold,
    IncreaseBlinkDuration,
    DecreaseBlinkDuration,
    IncreaseClickInterval,
    DecreaseClickInterval,
    IncreaseRightClickDuration,
    DecreaseRightClickDuration,
    IncreaseDragDuration,
    DecreaseDragDuration,
    IncreaseDragConfirmDelay,
    DecreaseDragConfirmDelay,
    IncreaseMouthOpenThreshold,
    DecreaseMouthOpenThreshold,
    IncreaseMouthOpenDuration,
    DecreaseMouthOpenDuration,
    IncreaseSafeMargin,
    DecreaseSafeMargin,
    IncreaseScrollAmount,
    DecreaseScrollAmount,
    IncreaseSmoothingWindow,
    DecreaseSmoothingWindow,
    /// Restore every threshold to its default
    Reset,
}

impl ThresholdCommand {
    /// Every command, in declaration order
    pub const ALL: [Self; 29] = [
        Self::IncreaseSensitivity,
        Self::DecreaseSensitivity,
        Self::IncreaseMovementRange,
        Self::DecreaseMovementRange,
        Self::IncreaseNodThreshold,
        Self::DecreaseNodThreshold,
        Self::IncreaseBlinkThreshold,
        Self::DecreaseBlinkThreshold,
        Self::IncreaseBlinkDuration,
        Self::DecreaseBlinkDuration,
        Self::IncreaseClickInterval,
        Self::DecreaseClickInterval,
        Self::IncreaseRightClickDuration,
        Self::DecreaseRightClickDuration,
        Self::IncreaseDragDuration,
        Self::DecreaseDragDuration,
        Self::IncreaseDragConfirmDelay,
        Self::DecreaseDragConfirmDelay,
        Self::IncreaseMouthOpenThreshold,
        Self::DecreaseMouthOpenThreshold,
        Self::IncreaseMouthOpenDuration,
        Self::DecreaseMouthOpenDuration,
        Self::IncreaseSafeMargin,
        Self::DecreaseSafeMargin,
        Self::IncreaseScrollAmount,
        Self::DecreaseScrollAmount,
        Self::IncreaseSmoothingWindow,
        Self::DecreaseSmoothingWindow,
        Self::Reset,
    ];

    /// Name of the adjusted threshold, `None` for [`ThresholdCommand::Reset`]
    #[must_use]
    pub const fn threshold_name(self) -> Option<&'static str> {
        use ThresholdCommand::*;
        Some(match self {
            IncreaseSensitivity | DecreaseSensitivity => "sensitivity",
            IncreaseMovementRange | DecreaseMovementRange => "movement_range",
            IncreaseNodThreshold | DecreaseNodThreshold => "nod_threshold",
            IncreaseBlinkThreshold | DecreaseBlinkThreshold => "blink_threshold",
            IncreaseBlinkDuration | DecreaseBlinkDuration => "blink_duration",
            IncreaseClickInterval | DecreaseClickInterval => "click_interval",
            IncreaseRightClickDuration | DecreaseRightClickDuration => "right_click_duration",
            IncreaseDragDuration | DecreaseDragDuration => "drag_duration",
            IncreaseDragConfirmDelay | DecreaseDragConfirmDelay => "drag_confirm_delay",
            IncreaseMouthOpenThreshold | DecreaseMouthOpenThreshold => "mouth_open_threshold",
            IncreaseMouthOpenDuration | DecreaseMouthOpenDuration => "mouth_open_duration",
            IncreaseSafeMargin | DecreaseSafeMargin => "safe_margin",
            IncreaseScrollAmount | DecreaseScrollAmount => "scroll_amount",
            IncreaseSmoothingWindow | DecreaseSmoothingWindow => "smoothing_window",
            Reset => return None,
        })
    }

    /// True for the increment half of each pair
    #[must_use]
    pub const fn is_increase(self) -> bool {
        use ThresholdCommand::*;
        matches!(
            self,
            IncreaseSensitivity
                | IncreaseMovementRange
                | IncreaseNodThreshold
                | IncreaseBlinkThreshold
                | IncreaseBlinkDuration
                | IncreaseClickInterval
                | IncreaseRightClickDuration
                | IncreaseDragDuration
                | IncreaseDragConfirmDelay
                | IncreaseMouthOpenThreshold
                | IncreaseMouthOpenDuration
                | IncreaseSafeMargin
                | IncreaseScrollAmount
                | IncreaseSmoothingWindow
        )
    }

    /// Apply the command to `thresholds` in place
    pub fn apply_to(self, thresholds: &mut Thresholds) {
        use ThresholdCommand::*;
        let t = thresholds;
        match self {
            IncreaseSensitivity => t.sensitivity += 0.1,
            DecreaseSensitivity => t.sensitivity = (t.sensitivity - 0.1).max(0.1),
            IncreaseMovementRange => t.movement_range += 0.01,
            DecreaseMovementRange => t.movement_range = (t.movement_range - 0.01).max(0.01),
            IncreaseNodThreshold => t.nod_threshold += 0.001,
            DecreaseNodThreshold => t.nod_threshold = (t.nod_threshold - 0.001).max(0.001),
            IncreaseBlinkThreshold => t.blink_threshold += 0.001,
            DecreaseBlinkThreshold => t.blink_threshold = (t.blink_threshold - 0.001).max(0.001),
            IncreaseBlinkDuration => t.blink_duration += 0.01,
            DecreaseBlinkDuration => t.blink_duration = (t.blink_duration - 0.01).max(0.01),
            IncreaseClickInterval => t.click_interval += 0.1,
            DecreaseClickInterval => t.click_interval = (t.click_interval - 0.1).max(0.1),
            IncreaseRightClickDuration => t.right_click_duration += 0.1,
            DecreaseRightClickDuration => {
                t.right_click_duration = (t.right_click_duration - 0.1).max(0.1);
            }
            IncreaseDragDuration => t.drag_duration += 0.05,
            DecreaseDragDuration => t.drag_duration = (t.drag_duration - 0.05).max(0.05),
            IncreaseDragConfirmDelay => t.drag_confirm_delay += 0.05,
            DecreaseDragConfirmDelay => {
                t.drag_confirm_delay = (t.drag_confirm_delay - 0.05).max(0.05);
            }
            IncreaseMouthOpenThreshold => {
                t.mouth_open_threshold = (t.mouth_open_threshold + 0.1).min(1.0);
            }
            DecreaseMouthOpenThreshold => {
                t.mouth_open_threshold = (t.mouth_open_threshold - 0.1).max(0.1);
            }
            IncreaseMouthOpenDuration => {
                t.mouth_open_duration = (t.mouth_open_duration + 0.1).min(2.0);
            }
            DecreaseMouthOpenDuration => {
                t.mouth_open_duration = (t.mouth_open_duration - 0.1).max(0.1);
            }
            IncreaseSafeMargin => t.safe_margin += 1,
            DecreaseSafeMargin => t.safe_margin = t.safe_margin.saturating_sub(1).max(1),
            IncreaseScrollAmount => t.scroll_amount += 50,
            DecreaseScrollAmount => t.scroll_amount = t.scroll_amount.saturating_sub(50).max(50),
            IncreaseSmoothingWindow => {
                t.smoothing_window = (t.smoothing_window + 1).min(MAX_SMOOTHING_WINDOW);
            }
            DecreaseSmoothingWindow => t.smoothing_window = t.smoothing_window.saturating_sub(1).max(1),
            Reset => *t = Thresholds::default(),
        }
    }
}

impl fmt::Display for ThresholdCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.threshold_name() {
            Some(name) => write!(f, "{name}{}", if self.is_increase() { '+' } else { '-' }),
            None => f.write_str("reset"),
        }
    }
}

impl FromStr for ThresholdCommand {
    type Err = Error;

    /// Parses `<threshold>+`, `<threshold>-` or `reset`
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|command| command.to_string() == wanted)
            .ok_or_else(|| Error::UnknownCommand(s.trim().to_string()))
    }
}

/// Where thresholds are stored between runs
pub trait ThresholdPersistence: Send + Sync {
    /// Read saved thresholds, `Ok(None)` when nothing was saved yet
    fn load(&self) -> Result<Option<Thresholds>>;

    /// Replace the saved thresholds
    fn save(&self, thresholds: &Thresholds) -> Result<()>;
}

/// Thresholds kept as a YAML mapping in a file
pub struct YamlFilePersistence {
    path: PathBuf,
}

impl YamlFilePersistence {
    /// Persist to `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Backing file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ThresholdPersistence for YamlFilePersistence {
    fn load(&self) -> Result<Option<Thresholds>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        serde_yaml::from_str(&content)
            .map(Some)
            .map_err(|e| Error::Persistence(format!("Failed to parse {}: {e}", self.path.display())))
    }

    fn save(&self, thresholds: &Thresholds) -> Result<()> {
        let content = serde_yaml::to_string(thresholds)
            .map_err(|e| Error::Persistence(format!("Failed to serialize thresholds: {e}")))?;
        std::fs::write(&self.path, content)?;
        debug!("Thresholds written to {}", self.path.display());
        Ok(())
    }
}

/// Keeps the last saved thresholds in memory, used for dry runs and tests
#[derive(Default)]
pub struct MemoryPersistence {
    saved: Mutex<Option<Thresholds>>,
}

impl MemoryPersistence {
    /// Start with `initial` already saved
    #[must_use]
    pub fn with_saved(initial: Thresholds) -> Self {
        Self {
            saved: Mutex::new(Some(initial)),
        }
    }

    /// Last saved thresholds
    pub fn saved(&self) -> Option<Thresholds> {
        self.saved.lock().ok().and_then(|saved| saved.clone())
    }
}

impl ThresholdPersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<Thresholds>> {
        self.saved
            .lock()
            .map(|saved| saved.clone())
            .map_err(|_| Error::LockPoisoned("memory persistence"))
    }

    fn save(&self, thresholds: &Thresholds) -> Result<()> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| Error::LockPoisoned("memory persistence"))?;
        *saved = Some(thresholds.clone());
        Ok(())
    }
}

/// Shared, persisted thresholds.
///
/// Readers take a snapshot once per frame. Writers go through [`apply`],
/// which holds the write lock across the mutation and the persistence write
/// so saved files always match the order of mutations.
///
/// [`apply`]: ThresholdStore::apply
pub struct ThresholdStore {
    current: RwLock<Thresholds>,
    persistence: Box<dyn ThresholdPersistence>,
}

impl ThresholdStore {
    /// Load thresholds from `persistence`, falling back to defaults.
    ///
    /// A missing entry is created with the defaults. An unreadable or
    /// corrupt entry is logged and replaced by defaults in memory only.
    pub fn open(persistence: Box<dyn ThresholdPersistence>) -> Self {
        let initial = match persistence.load() {
            Ok(Some(saved)) => {
                info!("Thresholds loaded");
                saved.clamped()
            }
            Ok(None) => {
                let defaults = Thresholds::default();
                match persistence.save(&defaults) {
                    Ok(()) => info!("No saved thresholds, created defaults"),
                    Err(e) => warn!("Failed to save default thresholds: {e}"),
                }
                defaults
            }
            Err(e) => {
                error!("Failed to load thresholds: {e}. Using defaults.");
                Thresholds::default()
            }
        };

        Self {
            current: RwLock::new(initial),
            persistence,
        }
    }

    /// Consistent copy of the current thresholds
    pub fn snapshot(&self) -> Result<Thresholds> {
        self.current
            .read()
            .map(|t| t.clone())
            .map_err(|_| Error::LockPoisoned("threshold store"))
    }

    /// Apply a tuning command and persist the result.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if saving fails; the in-memory value is
    /// still updated in that case.
    pub fn apply(&self, command: ThresholdCommand) -> Result<Thresholds> {
        let mut current = self
            .current
            .write()
            .map_err(|_| Error::LockPoisoned("threshold store"))?;
        command.apply_to(&mut current);
        let updated = current.clone();

        match command.threshold_name() {
            Some(name) => info!("Threshold {name} adjusted ({command})"),
            None => info!("All thresholds reset to defaults"),
        }

        self.persistence.save(&updated)?;
        Ok(updated)
    }
}

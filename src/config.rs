//! Configuration management for the face gesture control application

use crate::{
    constants::{DEFAULT_FRAME_INTERVAL_MS, DEFAULT_FRAME_SKIP, DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH},
    cursor_mapper::ScreenSize,
    filters::CursorFilter,
    utils::safe_cast::dimension,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Screen the cursor is mapped onto
    pub screen: ScreenConfig,

    /// Frame loop timing
    pub capture: CaptureConfig,

    /// Where landmark frames come from
    pub source: SourceConfig,

    /// Where actions go
    pub sink: SinkConfig,

    /// On-screen keyboard program
    pub keyboard: KeyboardConfig,

    /// Threshold persistence
    pub thresholds: ThresholdsConfig,
}

/// Screen configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Ask the X server for the screen size instead of using width/height
    pub auto_detect: bool,

    /// Screen width in pixels
    pub width: u32,

    /// Screen height in pixels
    pub height: u32,
}

/// Frame loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Evaluate every Nth acquired frame
    pub frame_skip: u32,

    /// Delay between loop iterations in milliseconds
    pub frame_interval_ms: u64,

    /// Seconds between status log lines, 0 disables them
    pub status_interval_secs: u64,
}

/// Landmark source configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Recorded landmark CSV to replay
    pub landmarks: Option<PathBuf>,
}

/// Action sink configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Log actions instead of injecting them
    pub dry_run: bool,

    /// Fixed cursor filter (`none`, `moving_average[:N]`, `exponential[:alpha]`).
    /// When unset the `smoothing_window` threshold controls smoothing.
    pub cursor_filter: Option<String>,
}

/// On-screen keyboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Program to launch
    pub program: String,

    /// Arguments passed to the program
    pub args: Vec<String>,
}

/// Threshold persistence configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    /// YAML file holding the tuned thresholds
    pub path: PathBuf,

    /// Write changes back to `path`
    pub persist: bool,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            auto_detect: true,
            width: DEFAULT_SCREEN_WIDTH,
            height: DEFAULT_SCREEN_HEIGHT,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_skip: DEFAULT_FRAME_SKIP,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            status_interval_secs: 5,
        }
    }
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            program: "onboard".to_string(),
            args: Vec::new(),
        }
    }
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("thresholds.yaml"),
            persist: true,
        }
    }
}

impl ScreenConfig {
    /// Configured size
    #[must_use]
    pub const fn size(&self) -> ScreenSize {
        ScreenSize::new(self.width, self.height)
    }
}

impl CaptureConfig {
    /// Pacing delay between iterations
    #[must_use]
    pub const fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))
    }

    /// Load from `path` if given, otherwise defaults, then validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create the configured fixed cursor filter, if any
    pub fn create_filter(&self) -> Result<Option<Box<dyn CursorFilter>>> {
        self.sink
            .cursor_filter
            .as_deref()
            .map(crate::filters::create_filter)
            .transpose()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Screen coordinates are signed on the wire
        if self.screen.width == 0 || self.screen.height == 0 {
            return Err(Error::ConfigError("Screen dimensions must be greater than 0".to_string()));
        }
        dimension(self.screen.width)
            .and_then(|_| dimension(self.screen.height))
            .map_err(|e| Error::ConfigError(format!("Screen dimensions out of range: {e}")))?;

        if self.capture.frame_skip == 0 {
            return Err(Error::ConfigError("Frame skip must be at least 1".to_string()));
        }

        if let Some(filter) = &self.sink.cursor_filter {
            crate::filters::create_filter(filter)
                .map_err(|e| Error::ConfigError(format!("Invalid cursor filter {filter:?}: {e}")))?;
        }

        if self.keyboard.program.trim().is_empty() {
            return Err(Error::ConfigError("Keyboard program must not be empty".to_string()));
        }

        if let Some(path) = &self.source.landmarks {
            if !path.exists() {
                return Err(Error::ConfigError(format!(
                    "Landmark recording not found: {}",
                    path.display()
                )));
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Face Gesture Control Configuration

# Screen the cursor is mapped onto
screen:
  auto_detect: true
  width: 1920
  height: 1080

# Frame loop timing
capture:
  frame_skip: 2
  frame_interval_ms: 30
  status_interval_secs: 5

# Landmark input
source:
  landmarks: null

# Action output
sink:
  dry_run: false
  cursor_filter: null

# On-screen keyboard
keyboard:
  program: "onboard"
  args: []

# Tuned thresholds
thresholds:
  path: "thresholds.yaml"
  persist: true
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_matches_defaults() {
        let parsed: AppConfig = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig = serde_yaml::from_str("capture:\n  frame_skip: 3\n").unwrap();
        assert_eq!(parsed.capture.frame_skip, 3);
        assert_eq!(parsed.capture.frame_interval_ms, DEFAULT_FRAME_INTERVAL_MS);
        assert_eq!(parsed.keyboard.program, "onboard");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.capture.frame_skip = 0;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let mut config = AppConfig::default();
        config.screen.width = u32::MAX;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let mut config = AppConfig::default();
        config.sink.cursor_filter = Some("kalman".to_string());
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let mut config = AppConfig::default();
        config.source.landmarks = Some(PathBuf::from("/nonexistent/frames.csv"));
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_create_filter() {
        let mut config = AppConfig::default();
        assert!(config.create_filter().unwrap().is_none());

        config.sink.cursor_filter = Some("moving_average:4".to_string());
        let filter = config.create_filter().unwrap().unwrap();
        assert_eq!(filter.name(), "MovingAverageFilter");
    }

    #[test]
    fn test_yaml_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("fgc-config-{}.yaml", std::process::id()));
        let mut config = AppConfig::default();
        config.sink.dry_run = true;
        config.to_file(&path).unwrap();

        let loaded = AppConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}

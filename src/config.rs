//! Configuration file support for the editor.
//!
//! Every section is optional in the file; missing values fall back to the
//! built-in defaults.

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::ai::PollConfig;
use crate::constants::{
    BUTTON_SCALE_STEP, DEFAULT_BRUSH_SIZE, DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_POLL_ATTEMPTS,
    DEFAULT_POINT_RESOLUTION, DEFAULT_POLL_INTERVAL, MAX_SCALE, MIN_SCALE,
    VISUAL_PROMPT_CONFIDENCE, WHEEL_SCALE_STEP,
};
use crate::history::HistoryConfig;
use crate::model::Category;

/// Verbosity of the `log` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

/// Install the native logger at `level`. A second call is a no-op.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logger(level: LogLevel) {
    let _ = env_logger::Builder::new()
        .filter_level(level.into())
        .try_init();
}

/// Newest config file layout this build understands.
pub const CONFIG_VERSION: u32 = 1;

/// Zoom limits and steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomSettings {
    pub min_scale: f32,
    pub max_scale: f32,
    /// Step of the zoom buttons
    pub button_step: f32,
    /// Step of one wheel notch
    pub wheel_step: f32,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            button_step: BUTTON_SCALE_STEP,
            wheel_step: WHEEL_SCALE_STEP,
        }
    }
}

/// Undo history settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Snapshots kept before the oldest is evicted
    pub capacity: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl HistorySettings {
    pub fn to_history_config(&self) -> HistoryConfig {
        HistoryConfig {
            max_history: self.capacity,
        }
    }
}

/// Initial tool parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Mask brush width in natural pixels
    pub brush_size: f32,
    /// Polygon density requested from segmentation
    pub point_resolution: f32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            brush_size: DEFAULT_BRUSH_SIZE,
            point_resolution: DEFAULT_POINT_RESOLUTION,
        }
    }
}

/// Model service settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    /// Confidence threshold for visual-prompt boxes
    pub visual_prompt_threshold: f32,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            visual_prompt_threshold: VISUAL_PROMPT_CONFIDENCE,
        }
    }
}

impl AiSettings {
    pub fn to_poll_config(&self) -> PollConfig {
        PollConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_poll_attempts: self.max_poll_attempts,
        }
    }
}

/// Everything the editor reads from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub version: u32,
    pub zoom: ZoomSettings,
    pub history: HistorySettings,
    pub tools: ToolSettings,
    pub ai: AiSettings,
    /// Space kept around the image when it is fitted, in container pixels
    pub padding: f32,
    pub log_level: LogLevel,
    /// Label set offered to the annotator
    pub categories: Vec<Category>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            zoom: ZoomSettings::default(),
            history: HistorySettings::default(),
            tools: ToolSettings::default(),
            ai: AiSettings::default(),
            padding: 0.0,
            log_level: LogLevel::default(),
            categories: Vec::new(),
        }
    }
}

impl EditorConfig {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a config, refusing layouts newer than [`CONFIG_VERSION`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }
        Ok(config)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!("⚙️ Loaded configuration from {:?}", path);
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Config version {found} is newer than the supported {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = EditorConfig::from_json("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.history.to_history_config().max_history, 20);
        assert_eq!(config.ai.to_poll_config(), PollConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let json = r##"{
            "version": 1,
            "zoom": { "max_scale": 8.0 },
            "ai": { "max_poll_attempts": 3 },
            "log_level": "debug",
            "categories": [{ "id": 1, "name": "car", "color": "#ff0000" }]
        }"##;
        let config = EditorConfig::from_json(json).unwrap();
        assert_eq!(config.zoom.max_scale, 8.0);
        assert_eq!(config.zoom.min_scale, MIN_SCALE);
        assert_eq!(config.ai.max_poll_attempts, 3);
        assert_eq!(log::LevelFilter::from(config.log_level), log::LevelFilter::Debug);
        assert_eq!(config.categories[0].name, "car");
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let err = EditorConfig::from_json(r#"{ "version": 99 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedVersion {
                found: 99,
                supported: 1
            }
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = EditorConfig::default();
        config.padding = 12.0;
        let json = config.to_json().unwrap();
        assert_eq!(EditorConfig::from_json(&json).unwrap(), config);
    }
}

use crate::camera::{AspectRatio, CameraFacing, CaptureMode};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ViewfinderConfig {
    pub camera: CameraConfig,
    pub capture: CaptureConfig,
    pub feedback: FeedbackConfig,
    pub focus: FocusConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Lens selected before the user flips the camera
    #[serde(default = "default_facing")]
    pub default_facing: CameraFacing,

    /// Aspect ratio requested for preview and capture
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: AspectRatio,

    /// Latency/quality trade-off for still capture
    #[serde(default = "default_capture_mode")]
    pub capture_mode: CaptureMode,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Directory accepted pictures are written to
    #[serde(default = "default_capture_path")]
    pub path: String,

    /// JPEG quality (1-100) for accepted pictures
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Write a JSON metadata file next to each accepted picture
    #[serde(default = "default_save_metadata")]
    pub save_metadata: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FeedbackConfig {
    /// Play the shutter click when the ringer allows it
    #[serde(default = "default_shutter_sound")]
    pub shutter_sound: bool,

    /// Vibration pulse length in milliseconds
    #[serde(default = "default_vibration_ms")]
    pub vibration_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FocusConfig {
    /// Seconds before a tap-to-focus request is cancelled by the hardware
    #[serde(default = "default_auto_cancel_seconds")]
    pub auto_cancel_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

impl FeedbackConfig {
    pub fn vibration(&self) -> Duration {
        Duration::from_millis(self.vibration_ms)
    }
}

impl FocusConfig {
    pub fn auto_cancel(&self) -> Duration {
        Duration::from_secs(self.auto_cancel_seconds)
    }
}

impl ViewfinderConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.default_facing", "Back")?
            .set_default("camera.aspect_ratio", "Ratio4x3")?
            .set_default("camera.capture_mode", "MinimizeLatency")?
            .set_default("capture.path", default_capture_path())?
            .set_default("capture.jpeg_quality", default_jpeg_quality() as i64)?
            .set_default("capture.save_metadata", default_save_metadata())?
            .set_default("feedback.shutter_sound", default_shutter_sound())?
            .set_default("feedback.vibration_ms", default_vibration_ms() as i64)?
            .set_default("focus.auto_cancel_seconds", default_auto_cancel_seconds() as i64)?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(
                Environment::with_prefix("VIEWFINDER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ViewfinderConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.jpeg_quality == 0 || self.capture.jpeg_quality > 100 {
            return Err(ConfigError::Message(
                "Capture jpeg_quality must be between 1 and 100".to_string(),
            ));
        }

        if self.capture.path.trim().is_empty() {
            return Err(ConfigError::Message(
                "Capture path must not be empty".to_string(),
            ));
        }

        if self.feedback.vibration_ms == 0 {
            return Err(ConfigError::Message(
                "Feedback vibration_ms must be greater than 0".to_string(),
            ));
        }

        if self.focus.auto_cancel_seconds == 0 {
            return Err(ConfigError::Message(
                "Focus auto_cancel_seconds must be greater than 0".to_string(),
            ));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for ViewfinderConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                default_facing: default_facing(),
                aspect_ratio: default_aspect_ratio(),
                capture_mode: default_capture_mode(),
            },
            capture: CaptureConfig {
                path: default_capture_path(),
                jpeg_quality: default_jpeg_quality(),
                save_metadata: default_save_metadata(),
            },
            feedback: FeedbackConfig {
                shutter_sound: default_shutter_sound(),
                vibration_ms: default_vibration_ms(),
            },
            focus: FocusConfig {
                auto_cancel_seconds: default_auto_cancel_seconds(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
            },
        }
    }
}

// Default value functions
fn default_facing() -> CameraFacing {
    CameraFacing::Back
}
fn default_aspect_ratio() -> AspectRatio {
    AspectRatio::Ratio4x3
}
fn default_capture_mode() -> CaptureMode {
    CaptureMode::MinimizeLatency
}

fn default_capture_path() -> String {
    "./pictures".to_string()
}
fn default_jpeg_quality() -> u8 {
    90
}
fn default_save_metadata() -> bool {
    true
}

fn default_shutter_sound() -> bool {
    true
}
fn default_vibration_ms() -> u64 {
    100
}

fn default_auto_cancel_seconds() -> u64 {
    5
}

fn default_event_bus_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ViewfinderConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.camera.default_facing, CameraFacing::Back);
        assert_eq!(config.feedback.vibration(), Duration::from_millis(100));
        assert_eq!(config.focus.auto_cancel(), Duration::from_secs(5));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ViewfinderConfig::load_from_file(dir.path().join("absent.toml")).unwrap();

        assert_eq!(config, ViewfinderConfig::default());
    }

    #[test]
    fn test_load_from_file_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[camera]
default_facing = "Front"
aspect_ratio = "Ratio16x9"

[capture]
path = "/tmp/viewfinder"
jpeg_quality = 75

[focus]
auto_cancel_seconds = 3
"#
        )
        .unwrap();

        let config = ViewfinderConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.camera.default_facing, CameraFacing::Front);
        assert_eq!(config.camera.aspect_ratio, AspectRatio::Ratio16x9);
        assert_eq!(config.camera.capture_mode, CaptureMode::MinimizeLatency);
        assert_eq!(config.capture.path, "/tmp/viewfinder");
        assert_eq!(config.capture.jpeg_quality, 75);
        assert_eq!(config.focus.auto_cancel_seconds, 3);
        assert_eq!(config.feedback.vibration_ms, 100);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ViewfinderConfig::default();

        config.capture.jpeg_quality = 0;
        assert!(config.validate().is_err());
        config.capture.jpeg_quality = 90;

        config.feedback.vibration_ms = 0;
        assert!(config.validate().is_err());
        config.feedback.vibration_ms = 100;

        config.system.event_bus_capacity = 0;
        assert!(config.validate().is_err());
        config.system.event_bus_capacity = 16;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip_is_loadable() {
        let rendered = ViewfinderConfig::default().to_toml().unwrap();
        let parsed: ViewfinderConfig = toml::from_str(&rendered).unwrap();

        assert_eq!(parsed, ViewfinderConfig::default());
    }
}

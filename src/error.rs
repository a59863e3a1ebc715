use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewfinderError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl ViewfinderError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Whether the error came from writing pictures or metadata
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io(_))
    }
}

/// Errors reported by a camera provider or a bound camera
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HardwareError {
    #[error("Camera does not support {feature}")]
    Unsupported { feature: String },

    #[error("{control} value {value} outside supported range [{min}, {max}]")]
    OutOfRange {
        control: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Failed to bind camera: {details}")]
    Bind { details: String },

    #[error("Camera operation failed: {details}")]
    Operation { details: String },
}

/// Errors delivered through the capture callback
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Capture failed in hardware: {details}")]
    Hardware { details: String },

    #[error("Failed to decode captured image: {details}")]
    Decode { details: String },

    #[error("Captured buffer is invalid: {details}")]
    InvalidBuffer { details: String },

    #[error("Camera was closed before the capture completed")]
    CameraClosed,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode picture: {details}")]
    Encode { details: String },
}

#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Receiver lagged behind by {skipped} events")]
    Lagged { skipped: u64 },

    #[error("Event bus channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, ViewfinderError>;

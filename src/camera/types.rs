use crate::frame::Rotation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Which physical lens is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CameraFacing {
    Front,
    #[default]
    Back,
}

impl CameraFacing {
    pub fn flipped(&self) -> Self {
        match self {
            CameraFacing::Front => CameraFacing::Back,
            CameraFacing::Back => CameraFacing::Front,
        }
    }
}

impl fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraFacing::Front => write!(f, "front"),
            CameraFacing::Back => write!(f, "back"),
        }
    }
}

/// Coarse mode the UI is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraState {
    /// Showing the live preview
    Live,
    /// Showing a captured still awaiting accept/discard
    ImageCaptured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    Ratio4x3,
    Ratio16x9,
}

impl AspectRatio {
    /// Width over height in landscape orientation
    pub fn value(&self) -> f64 {
        match self {
            AspectRatio::Ratio4x3 => 4.0 / 3.0,
            AspectRatio::Ratio16x9 => 16.0 / 9.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaptureMode {
    #[default]
    MinimizeLatency,
    MaximizeQuality,
}

/// Preview stream configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSettings {
    pub target_rotation: Rotation,
    pub aspect_ratio: AspectRatio,
}

/// Still capture configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub target_rotation: Rotation,
    pub aspect_ratio: AspectRatio,
    pub mode: CaptureMode,
}

/// Normalised coordinate inside the frame used for focus and metering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeteringPoint {
    x: f32,
    y: f32,
}

impl MeteringPoint {
    /// Build a point from normalised coordinates, clamped to [0, 1]
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }

    /// Map a tap inside a view of the given size onto the frame
    pub fn from_view(x: f32, y: f32, view_width: f32, view_height: f32) -> Self {
        if view_width <= 0.0 || view_height <= 0.0 {
            return Self::center();
        }
        Self::new(x / view_width, y / view_height)
    }

    pub fn center() -> Self {
        Self { x: 0.5, y: 0.5 }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.5
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeteringMode {
    AutoFocus,
    AutoExposure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FocusMeteringRequest {
    pub point: MeteringPoint,
    pub modes: Vec<MeteringMode>,
    /// `None` keeps the metering region until another request replaces it
    pub auto_cancel: Option<Duration>,
}

impl FocusMeteringRequest {
    /// Autofocus + auto-exposure at a point
    pub fn af_ae(point: MeteringPoint, auto_cancel: Duration) -> Self {
        Self {
            point,
            modes: vec![MeteringMode::AutoFocus, MeteringMode::AutoExposure],
            auto_cancel: Some(auto_cancel),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusResult {
    pub focus_successful: bool,
}

/// Exposure compensation capabilities of the bound camera
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureState {
    pub range: RangeInclusive<i32>,
    pub index: i32,
    /// EV per index step
    pub step: f32,
}

impl ExposureState {
    pub fn upper_bound(&self) -> i32 {
        *self.range.end()
    }

    /// A zero-width range means the camera has no exposure compensation
    pub fn is_supported(&self) -> bool {
        self.range.start() != self.range.end()
    }

    /// Map a normalised slider value onto an exposure index:
    /// 0.0 is the lower end, 0.5 is neutral and 1.0 is the upper bound.
    pub fn index_for(&self, value: f32) -> i32 {
        let value = if value.is_nan() {
            0.5
        } else {
            value.clamp(0.0, 1.0)
        };
        (((value * 2.0) - 1.0) * self.upper_bound() as f32) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exposure(upper: i32) -> ExposureState {
        ExposureState {
            range: -upper..=upper,
            index: 0,
            step: 1.0 / 3.0,
        }
    }

    #[test]
    fn test_facing_flips() {
        assert_eq!(CameraFacing::default(), CameraFacing::Back);
        assert_eq!(CameraFacing::Back.flipped(), CameraFacing::Front);
        assert_eq!(CameraFacing::Front.flipped(), CameraFacing::Back);
    }

    #[test]
    fn test_exposure_index_mapping() {
        let state = exposure(12);

        assert_eq!(state.index_for(0.0), -12);
        assert_eq!(state.index_for(0.5), 0);
        assert_eq!(state.index_for(1.0), 12);
        // truncated toward zero
        assert_eq!(state.index_for(0.7), 4);
        assert_eq!(state.index_for(0.3), -4);
    }

    #[test]
    fn test_exposure_support() {
        assert!(exposure(2).is_supported());
        assert!(!exposure(0).is_supported());
    }

    #[test]
    fn test_exposure_index_clamps_input() {
        let state = exposure(6);

        assert_eq!(state.index_for(-3.0), -6);
        assert_eq!(state.index_for(7.5), 6);
        assert_eq!(state.index_for(f32::NAN), 0);
    }

    #[test]
    fn test_metering_point_from_view() {
        let point = MeteringPoint::from_view(200.0, 150.0, 400.0, 300.0);
        assert_eq!(point, MeteringPoint::center());

        let clamped = MeteringPoint::from_view(-10.0, 900.0, 400.0, 300.0);
        assert_eq!((clamped.x(), clamped.y()), (0.0, 1.0));

        assert_eq!(
            MeteringPoint::from_view(1.0, 1.0, 0.0, 0.0),
            MeteringPoint::center()
        );
    }
}

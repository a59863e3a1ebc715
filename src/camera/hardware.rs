use super::types::{
    CameraFacing, CaptureSettings, ExposureState, FocusMeteringRequest, FocusResult,
    PreviewSettings,
};
use crate::error::{CaptureError, HardwareError};
use crate::frame::CapturedImage;
use crate::worker::WorkerHandle;
use async_trait::async_trait;
use std::sync::Arc;

/// Hardware session provider. Binding returns a camera handle that stays
/// valid until the provider unbinds it.
#[async_trait]
pub trait CameraProvider: Send + Sync {
    async fn bind(
        &self,
        facing: CameraFacing,
        preview: &PreviewSettings,
        capture: &CaptureSettings,
    ) -> Result<Arc<dyn Camera>, HardwareError>;

    fn unbind_all(&self);

    fn has_camera(&self, facing: CameraFacing) -> bool;
}

/// A bound camera: control surface plus still capture
#[async_trait]
pub trait Camera: Send + Sync {
    fn facing(&self) -> CameraFacing;

    fn has_flash_unit(&self) -> bool;

    async fn enable_torch(&self, enabled: bool) -> Result<(), HardwareError>;

    fn exposure_state(&self) -> ExposureState;

    /// Apply an exposure compensation index, returning the applied value
    async fn set_exposure_compensation_index(&self, index: i32) -> Result<i32, HardwareError>;

    /// Current zoom ratio, if the camera has reported one yet
    fn zoom_ratio(&self) -> Option<f32>;

    async fn set_zoom_ratio(&self, ratio: f32) -> Result<(), HardwareError>;

    async fn start_focus_and_metering(
        &self,
        request: FocusMeteringRequest,
    ) -> Result<FocusResult, HardwareError>;

    /// Request a still. The outcome is delivered to `callback` on `executor`.
    fn take_picture(
        &self,
        settings: &CaptureSettings,
        executor: &WorkerHandle,
        callback: Box<dyn ImageCapturedCallback>,
    );
}

/// Receives the outcome of a single [`Camera::take_picture`] request
pub trait ImageCapturedCallback: Send {
    fn on_capture_success(self: Box<Self>, image: CapturedImage);

    fn on_error(self: Box<Self>, error: CaptureError);
}

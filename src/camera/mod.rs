mod hardware;
mod mock;
mod types;
#[cfg(test)]
mod tests;

pub use hardware::{Camera, CameraProvider, ImageCapturedCallback};
pub use mock::{CaptureBehavior, MockCamera, MockCameraProvider, MockCameraSpec};
pub use types::{
    AspectRatio, CameraFacing, CameraState, CaptureMode, CaptureSettings, ExposureState,
    FocusMeteringRequest, FocusResult, MeteringMode, MeteringPoint, PreviewSettings,
};

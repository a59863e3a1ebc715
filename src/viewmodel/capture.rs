use super::state::ViewState;
use crate::camera::{CameraState, ImageCapturedCallback};
use crate::error::CaptureError;
use crate::events::{EventBus, ViewfinderEvent};
use crate::frame::CapturedImage;
use std::sync::Arc;
use tracing::{debug, error};

/// Completion handler for one still request. Runs on the capture worker.
pub(crate) struct CaptureCallback {
    state: Arc<ViewState>,
    event_bus: EventBus,
}

impl CaptureCallback {
    pub(crate) fn new(state: Arc<ViewState>, event_bus: EventBus) -> Self {
        Self { state, event_bus }
    }

    fn fail(&self, error: CaptureError) {
        error!("Picture capture failed: {}", error);
        self.state.end_capture();
        self.event_bus.emit(ViewfinderEvent::CaptureFailed {
            error: error.to_string(),
        });
    }
}

impl ImageCapturedCallback for CaptureCallback {
    fn on_capture_success(self: Box<Self>, image: CapturedImage) {
        debug!("Capture delivered {:?}", image);

        let decoded = image.decode();
        image.close();

        let picture = match decoded {
            Ok(picture) => picture,
            Err(error) => return self.fail(error),
        };

        let event = ViewfinderEvent::PictureCaptured {
            picture_id: picture.id(),
            width: picture.width(),
            height: picture.height(),
        };

        // capturing reads false by the time ImageCaptured is observable
        self.state.picture.set(picture);
        self.state.end_capture();
        self.state.camera_state.set(CameraState::ImageCaptured);
        self.event_bus.emit(event);
    }

    fn on_error(self: Box<Self>, error: CaptureError) {
        self.fail(error);
    }
}

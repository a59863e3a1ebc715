use crate::camera::{CameraFacing, CameraState};
use crate::frame::Picture;
use crate::observable::Observable;

/// Observable state exposed to the UI. Each field is independently
/// observable and replays its last value to late subscribers.
#[derive(Debug, Default)]
pub struct ViewState {
    pub flash_on: Observable<bool>,
    pub camera_facing: Observable<CameraFacing>,
    pub is_capturing_image: Observable<bool>,
    pub camera_state: Observable<CameraState>,
    pub picture: Observable<Picture>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish defaults for every field that has never been set
    pub(crate) fn publish_defaults(&self, default_facing: CameraFacing) {
        self.flash_on.set_if_unset(false);
        self.camera_facing.set_if_unset(default_facing);
        self.is_capturing_image.set_if_unset(false);
        self.camera_state.set_if_unset(CameraState::Live);
    }

    /// Mark a capture as in flight unless one already is.
    /// Returns `false` when a capture is pending.
    pub(crate) fn begin_capture(&self) -> bool {
        self.is_capturing_image
            .set_if(true, |current| current != Some(&true))
    }

    pub(crate) fn end_capture(&self) {
        self.is_capturing_image.set(false);
    }

    pub fn is_capturing(&self) -> bool {
        self.is_capturing_image.get().unwrap_or(false)
    }

    pub fn facing(&self) -> Option<CameraFacing> {
        self.camera_facing.get()
    }

    pub fn state(&self) -> Option<CameraState> {
        self.camera_state.get()
    }

    /// Snapshot of the current values, for logging and tests
    pub fn snapshot(&self) -> ViewStateSnapshot {
        ViewStateSnapshot {
            flash_on: self.flash_on.get(),
            camera_facing: self.camera_facing.get(),
            is_capturing_image: self.is_capturing_image.get(),
            camera_state: self.camera_state.get(),
            picture_dimensions: self.picture.get().map(|p| p.dimensions()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewStateSnapshot {
    pub flash_on: Option<bool>,
    pub camera_facing: Option<CameraFacing>,
    pub is_capturing_image: Option<bool>,
    pub camera_state: Option<CameraState>,
    pub picture_dimensions: Option<(u32, u32)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_defaults_only_fills_gaps() {
        let state = ViewState::new();
        state.camera_state.set(CameraState::ImageCaptured);

        state.publish_defaults(CameraFacing::Back);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.flash_on, Some(false));
        assert_eq!(snapshot.camera_facing, Some(CameraFacing::Back));
        assert_eq!(snapshot.is_capturing_image, Some(false));
        assert_eq!(snapshot.camera_state, Some(CameraState::ImageCaptured));
        assert_eq!(snapshot.picture_dimensions, None);
    }

    #[test]
    fn test_begin_capture_is_exclusive() {
        let state = ViewState::new();

        assert!(state.begin_capture());
        assert!(!state.begin_capture());
        state.end_capture();
        assert!(state.begin_capture());
    }
}

use super::accept::AcceptAction;
use super::capture::CaptureCallback;
use super::scope::ViewModelScope;
use super::state::ViewState;
use crate::camera::{
    AspectRatio, Camera, CameraFacing, CameraProvider, CameraState, CaptureMode, CaptureSettings,
    FocusMeteringRequest, MeteringPoint, PreviewSettings,
};
use crate::config::ViewfinderConfig;
use crate::error::{Result, ViewfinderError};
use crate::events::{EventBus, ViewfinderEvent};
use crate::feedback::Feedback;
use crate::frame::Rotation;
use crate::worker::{CaptureWorker, WorkerHandle};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Settings built by the last `on_start_camera`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UseCases {
    preview: PreviewSettings,
    capture: CaptureSettings,
}

/// State shared with tasks launched on the scope
struct Shared {
    state: Arc<ViewState>,
    provider: Mutex<Option<Arc<dyn CameraProvider>>>,
    camera: Mutex<Option<Arc<dyn Camera>>>,
    use_cases: Mutex<Option<UseCases>>,
    aspect_ratio: Mutex<AspectRatio>,
    feedback: Feedback,
    accept_action: AcceptAction,
    event_bus: EventBus,
    worker: WorkerHandle,
    default_facing: CameraFacing,
    capture_mode: CaptureMode,
    focus_auto_cancel: Duration,
}

impl Shared {
    fn camera(&self) -> Option<Arc<dyn Camera>> {
        self.camera.lock().clone()
    }

    fn use_cases(&self) -> Option<UseCases> {
        *self.use_cases.lock()
    }
}

/// Capture view-model: owns the observable camera state, drives the
/// start → preview → take picture → accept/discard flow and mediates
/// between the UI and an externally acquired camera session.
pub struct CaptureViewModel {
    shared: Arc<Shared>,
    worker: CaptureWorker,
    scope: ViewModelScope,
    destroyed: AtomicBool,
}

impl CaptureViewModel {
    pub fn new(
        config: &ViewfinderConfig,
        feedback: Feedback,
        accept_action: AcceptAction,
        event_bus: EventBus,
    ) -> Result<Self> {
        let worker = CaptureWorker::spawn("capture-worker")?;

        let shared = Arc::new(Shared {
            state: Arc::new(ViewState::new()),
            provider: Mutex::new(None),
            camera: Mutex::new(None),
            use_cases: Mutex::new(None),
            aspect_ratio: Mutex::new(config.camera.aspect_ratio),
            feedback,
            accept_action,
            event_bus,
            worker: worker.handle(),
            default_facing: config.camera.default_facing,
            capture_mode: config.camera.capture_mode,
            focus_auto_cancel: config.focus.auto_cancel(),
        });

        Ok(Self {
            shared,
            worker,
            scope: ViewModelScope::new(),
            destroyed: AtomicBool::new(false),
        })
    }

    /// Observable state
    pub fn state(&self) -> &ViewState {
        &self.shared.state
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.shared.event_bus
    }

    pub fn preview_settings(&self) -> Option<PreviewSettings> {
        self.shared.use_cases().map(|u| u.preview)
    }

    pub fn capture_settings(&self) -> Option<CaptureSettings> {
        self.shared.use_cases().map(|u| u.capture)
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        *self.shared.aspect_ratio.lock()
    }

    /// Select the aspect ratio used by the next `on_start_camera`
    pub fn set_aspect_ratio(&self, ratio: AspectRatio) {
        *self.shared.aspect_ratio.lock() = ratio;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Re-attachment hook: re-publish the retained picture, if any
    pub fn on_create(&self) {
        if self.shared.state.picture.republish() {
            debug!("Re-published retained picture to observers");
        }
    }

    /// (Re)build preview and capture settings for `rotation` and publish
    /// defaults for state that has never been set. Safe to call repeatedly.
    pub fn on_start_camera(&self, rotation: Rotation) {
        let aspect_ratio = self.aspect_ratio();
        let use_cases = UseCases {
            preview: PreviewSettings {
                target_rotation: rotation,
                aspect_ratio,
            },
            capture: CaptureSettings {
                target_rotation: rotation,
                aspect_ratio,
                mode: self.shared.capture_mode,
            },
        };
        *self.shared.use_cases.lock() = Some(use_cases);

        self.shared
            .state
            .publish_defaults(self.shared.default_facing);

        info!(
            "Camera started (rotation {}, aspect ratio {:?})",
            rotation, aspect_ratio
        );
        self.shared.event_bus.emit(ViewfinderEvent::CameraStarted {
            rotation,
            timestamp: SystemTime::now(),
        });
    }

    /// Release the worker and shutter sound, unbind the camera and cancel
    /// outstanding tasks. Only the first call has any effect.
    pub fn on_destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            debug!("Capture view-model already destroyed");
            return;
        }

        info!("Destroying capture view-model");
        self.scope.cancel();
        self.worker.shutdown();
        self.shared.feedback.release();

        let provider = self.shared.provider.lock().clone();
        if let Some(provider) = provider {
            provider.unbind_all();
        }
        self.shared.camera.lock().take();
    }

    pub fn set_camera_provider(&self, provider: Arc<dyn CameraProvider>) {
        debug!("Camera provider set");
        *self.shared.provider.lock() = Some(provider);
    }

    pub fn set_camera(&self, camera: Arc<dyn Camera>) {
        debug!("Camera set ({} facing)", camera.facing());
        *self.shared.camera.lock() = Some(camera);
    }

    pub fn camera(&self) -> Option<Arc<dyn Camera>> {
        self.shared.camera()
    }

    /// Bind the current facing and settings through the provider and
    /// inject the resulting camera. Replaces any previous binding.
    pub async fn bind_camera(&self) -> Result<Arc<dyn Camera>> {
        let provider = self
            .shared
            .provider
            .lock()
            .clone()
            .ok_or_else(|| ViewfinderError::system("Camera provider not set"))?;
        let use_cases = self
            .shared
            .use_cases()
            .ok_or_else(|| ViewfinderError::system("Camera settings not built; start the camera first"))?;
        let facing = self
            .shared
            .state
            .facing()
            .unwrap_or(self.shared.default_facing);

        provider.unbind_all();
        let camera = provider
            .bind(facing, &use_cases.preview, &use_cases.capture)
            .await?;

        if self.shared.state.flash_on.get() == Some(true) {
            if camera.has_flash_unit() {
                if let Err(e) = camera.enable_torch(true).await {
                    warn!("Failed to restore torch after binding: {}", e);
                }
            } else {
                self.shared.state.flash_on.set(false);
            }
        }

        self.set_camera(Arc::clone(&camera));
        self.shared
            .event_bus
            .emit(ViewfinderEvent::CameraBound { facing });

        Ok(camera)
    }

    /// Toggle Back ↔ Front. Takes effect on the next bind.
    pub fn flip_camera(&self) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        self.scope.launch("flip_camera", async move {
            let next = shared
                .state
                .facing()
                .unwrap_or(CameraFacing::Back)
                .flipped();
            shared.state.camera_facing.set(next);
            debug!("Camera facing set to {}", next);
            shared
                .event_bus
                .emit(ViewfinderEvent::FacingChanged { facing: next });
        })
    }

    /// Invert the torch. No-op without a bound camera or a flash unit.
    pub fn toggle_flash(&self) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        self.scope.launch("toggle_flash", async move {
            let Some(camera) = shared.camera() else {
                debug!("Ignoring flash toggle: no camera bound");
                return;
            };
            if !camera.has_flash_unit() {
                debug!("Ignoring flash toggle: camera has no flash unit");
                return;
            }

            let enabled = !shared.state.flash_on.get().unwrap_or(false);
            if let Err(e) = camera.enable_torch(enabled).await {
                warn!("Failed to switch torch {}: {}", if enabled { "on" } else { "off" }, e);
                return;
            }
            shared.state.flash_on.set(enabled);
            shared
                .event_bus
                .emit(ViewfinderEvent::TorchChanged { enabled });
        })
    }

    /// Map `value` in [0, 1] onto the camera's exposure compensation range
    pub fn update_exposure(&self, value: f32) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        self.scope.launch("update_exposure", async move {
            let Some(camera) = shared.camera() else {
                debug!("Ignoring exposure update: no camera bound");
                return;
            };

            let exposure = camera.exposure_state();
            if !exposure.is_supported() {
                debug!("Ignoring exposure update: camera has no exposure compensation");
                return;
            }
            let index = exposure.index_for(value);
            match camera.set_exposure_compensation_index(index).await {
                Ok(applied) => debug!("Exposure compensation index set to {}", applied),
                Err(e) => warn!("Failed to set exposure compensation {}: {}", index, e),
            }
        })
    }

    /// Multiply the current zoom ratio (1.0 when unknown) by `delta`
    pub fn update_zoom(&self, delta: f32) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        self.scope.launch("update_zoom", async move {
            let Some(camera) = shared.camera() else {
                debug!("Ignoring zoom update: no camera bound");
                return;
            };
            if !delta.is_finite() || delta <= 0.0 {
                debug!("Ignoring zoom delta {}", delta);
                return;
            }

            let ratio = camera.zoom_ratio().unwrap_or(1.0) * delta;
            match camera.set_zoom_ratio(ratio).await {
                Ok(()) => debug!("Zoom ratio set to {:.2}", ratio),
                Err(e) => warn!("Failed to set zoom ratio {:.2}: {}", ratio, e),
            }
        })
    }

    /// Autofocus and auto-exposure metering at `point`
    pub fn focus(&self, point: MeteringPoint) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        self.scope.launch("focus", async move {
            let Some(camera) = shared.camera() else {
                debug!("Ignoring focus request: no camera bound");
                return;
            };

            let request = FocusMeteringRequest::af_ae(point, shared.focus_auto_cancel);
            match camera.start_focus_and_metering(request).await {
                Ok(result) => debug!(
                    "Focus at ({:.2}, {:.2}) finished, successful: {}",
                    point.x(),
                    point.y(),
                    result.focus_successful
                ),
                Err(e) => warn!("Focus metering failed: {}", e),
            }
        })
    }

    /// Take a still. Ignored while another capture is in flight or no
    /// camera is bound.
    pub fn take_picture(&self) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        self.scope.launch("take_picture", async move {
            let Some(camera) = shared.camera() else {
                debug!("Ignoring capture request: no camera bound");
                return;
            };
            let Some(use_cases) = shared.use_cases() else {
                debug!("Ignoring capture request: camera not started");
                return;
            };
            if !shared.worker.is_accepting() {
                debug!("Ignoring capture request: capture worker stopped");
                return;
            }
            if !shared.state.begin_capture() {
                debug!("Ignoring capture request: capture already in flight");
                return;
            }

            shared.feedback.on_shutter();

            let callback = CaptureCallback::new(
                Arc::clone(&shared.state),
                shared.event_bus.clone(),
            );
            camera.take_picture(&use_cases.capture, &shared.worker, Box::new(callback));
        })
    }

    /// Run the accept action on the captured picture and return to live
    /// preview when it succeeds
    pub fn accept_captured_picture(&self) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        self.scope.launch("accept_captured_picture", async move {
            if shared.state.state() != Some(CameraState::ImageCaptured) {
                debug!("Ignoring accept: no captured picture");
                return;
            }
            let Some(picture) = shared.state.picture.get() else {
                debug!("Ignoring accept: no captured picture");
                return;
            };

            match shared.accept_action.run(&picture).await {
                Ok(path) => {
                    shared.state.camera_state.set(CameraState::Live);
                    shared.event_bus.emit(ViewfinderEvent::PictureAccepted {
                        picture_id: picture.id(),
                        path,
                    });
                }
                Err(e) => {
                    shared.event_bus.emit(ViewfinderEvent::AcceptFailed {
                        picture_id: picture.id(),
                        error: e.to_string(),
                    });
                }
            }
        })
    }

    /// Return to live preview. The retained picture is left in place.
    pub fn discard_captured_picture(&self) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        self.scope.launch("discard_captured_picture", async move {
            let previous = shared.state.state();
            shared.state.camera_state.set(CameraState::Live);

            let picture_id = match previous {
                Some(CameraState::ImageCaptured) => shared.state.picture.get().map(|p| p.id()),
                _ => None,
            };
            shared
                .event_bus
                .emit(ViewfinderEvent::PictureDiscarded { picture_id });
        })
    }
}

impl Drop for CaptureViewModel {
    fn drop(&mut self) {
        if !self.is_destroyed() {
            warn!("Capture view-model dropped without on_destroy");
            self.on_destroy();
        }
    }
}

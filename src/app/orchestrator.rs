use super::types::UserAction;
use crate::camera::{
    Camera, CameraFacing, CameraProvider, MeteringPoint, MockCameraProvider, MockCameraSpec,
};
use crate::config::ViewfinderConfig;
use crate::error::Result;
use crate::events::EventBus;
use crate::feedback::{
    AudioService, Feedback, LoggingVibrator, RingerMode, SwitchableRinger, TerminalBell,
};
use crate::frame::Rotation;
use crate::viewmodel::{CaptureViewModel, CaptureViewModelBuilder};
use std::sync::Arc;
use tracing::{debug, info};

const ZOOM_STEP: f32 = 1.25;
const EXPOSURE_STEP: f32 = 0.1;

/// Terminal viewfinder: a capture view-model driven by keyboard actions
/// against a simulated camera
pub struct ViewfinderApp {
    pub(super) config: ViewfinderConfig,
    pub(super) provider: Arc<MockCameraProvider>,
    pub(super) ringer: Arc<SwitchableRinger>,
    pub(super) view_model: CaptureViewModel,
    pub(super) rotation: Rotation,
    pub(super) exposure: f32,
}

impl ViewfinderApp {
    /// Create the application with the simulated camera provider
    pub fn new(config: ViewfinderConfig, rotation: Rotation) -> Result<Self> {
        Self::with_camera(config, rotation, MockCameraSpec::default())
    }

    pub fn with_camera(
        config: ViewfinderConfig,
        rotation: Rotation,
        spec: MockCameraSpec,
    ) -> Result<Self> {
        let ringer = Arc::new(SwitchableRinger::new(RingerMode::Normal));
        let feedback = Feedback::new(
            ringer.clone(),
            Arc::new(TerminalBell),
            Arc::new(LoggingVibrator),
            &config.feedback,
        );
        let event_bus = EventBus::with_debug_logging(config.system.event_bus_capacity);

        let view_model = CaptureViewModelBuilder::new()
            .config(config.clone())
            .feedback(feedback)
            .event_bus(event_bus)
            .build()?;

        let provider = Arc::new(MockCameraProvider::new(spec));
        view_model.set_camera_provider(provider.clone());

        Ok(Self {
            config,
            provider,
            ringer,
            view_model,
            rotation,
            exposure: 0.5,
        })
    }

    pub fn config(&self) -> &ViewfinderConfig {
        &self.config
    }

    pub fn view_model(&self) -> &CaptureViewModel {
        &self.view_model
    }

    pub fn provider(&self) -> &Arc<MockCameraProvider> {
        &self.provider
    }

    pub fn ringer_mode(&self) -> RingerMode {
        self.ringer.ringer_mode()
    }

    /// Attach, build settings and bind the camera for the current facing
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting viewfinder (rotation {})", self.rotation);

        self.view_model.on_create();
        self.view_model.on_start_camera(self.rotation);
        let camera = self.view_model.bind_camera().await?;

        info!("Viewfinder ready with {} camera", camera.facing());
        Ok(())
    }

    /// Apply one user action. Returns `false` when the loop should stop.
    pub async fn handle_action(&mut self, action: UserAction) -> Result<bool> {
        debug!("Handling user action {:?}", action);

        match action {
            UserAction::TakePicture => {
                let _ = self.view_model.take_picture().await;
            }
            UserAction::Accept => {
                let _ = self.view_model.accept_captured_picture().await;
            }
            UserAction::Discard => {
                let _ = self.view_model.discard_captured_picture().await;
            }
            UserAction::FlipCamera => {
                let _ = self.view_model.flip_camera().await;
                self.rebind().await?;
            }
            UserAction::ToggleFlash => {
                let _ = self.view_model.toggle_flash().await;
            }
            UserAction::ZoomIn => {
                let _ = self.view_model.update_zoom(ZOOM_STEP).await;
            }
            UserAction::ZoomOut => {
                let _ = self.view_model.update_zoom(1.0 / ZOOM_STEP).await;
            }
            UserAction::ExposureUp => self.step_exposure(EXPOSURE_STEP).await,
            UserAction::ExposureDown => self.step_exposure(-EXPOSURE_STEP).await,
            UserAction::FocusCenter => {
                let _ = self.view_model.focus(MeteringPoint::center()).await;
            }
            UserAction::CycleRinger => {
                let mode = self.ringer.cycle();
                info!("Ringer mode set to {:?}", mode);
            }
            UserAction::Quit => return Ok(false),
        }

        Ok(true)
    }

    /// Rebind after a facing change, keeping the old camera if the new
    /// lens is unavailable
    async fn rebind(&mut self) -> Result<()> {
        let facing = self
            .view_model
            .state()
            .facing()
            .unwrap_or(self.config.camera.default_facing);

        if !self.provider.has_camera(facing) {
            info!("No {} camera available, flipping back", facing);
            let _ = self.view_model.flip_camera().await;
            return Ok(());
        }

        self.view_model.bind_camera().await?;
        Ok(())
    }

    async fn step_exposure(&mut self, step: f32) {
        self.exposure = (self.exposure + step).clamp(0.0, 1.0);
        let _ = self.view_model.update_exposure(self.exposure).await;
    }

    pub fn current_facing(&self) -> Option<CameraFacing> {
        self.view_model.state().facing()
    }
}

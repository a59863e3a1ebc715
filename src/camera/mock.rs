use super::hardware::{Camera, CameraProvider, ImageCapturedCallback};
use super::types::{
    CameraFacing, CaptureSettings, ExposureState, FocusMeteringRequest, FocusResult,
    PreviewSettings,
};
use crate::error::{CaptureError, HardwareError};
use crate::frame::{CapturedImage, FrameFormat};
use crate::worker::WorkerHandle;
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageBuffer, Rgb};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Capabilities of a simulated camera
#[derive(Debug, Clone)]
pub struct MockCameraSpec {
    pub has_flash_unit: bool,
    /// Exposure index range is `-exposure_upper..=exposure_upper`
    pub exposure_upper: i32,
    pub max_zoom: f32,
    /// Sensor frame size before rotation
    pub frame_size: (u32, u32),
    /// Rotation reported with every still
    pub rotation_degrees: i32,
}

impl Default for MockCameraSpec {
    fn default() -> Self {
        Self {
            has_flash_unit: true,
            exposure_upper: 12,
            max_zoom: 8.0,
            frame_size: (640, 480),
            rotation_degrees: 90,
        }
    }
}

/// What the next still request does
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureBehavior {
    /// Deliver a JPEG test pattern
    Succeed,
    /// Deliver an error
    Fail(CaptureError),
    /// Keep the request pending until [`MockCamera::complete_held`]
    Hold,
}

struct HeldCapture {
    executor: WorkerHandle,
    callback: Box<dyn ImageCapturedCallback>,
}

/// Simulated bound camera for tests and the demo binary
pub struct MockCamera {
    facing: CameraFacing,
    spec: MockCameraSpec,
    torch: AtomicBool,
    torch_failure: AtomicBool,
    torch_calls: Mutex<Vec<bool>>,
    exposure_index: Mutex<i32>,
    exposure_calls: Mutex<Vec<i32>>,
    zoom: Mutex<Option<f32>>,
    zoom_calls: Mutex<Vec<f32>>,
    focus_requests: Mutex<Vec<FocusMeteringRequest>>,
    focus_active: Arc<AtomicBool>,
    behavior: Mutex<CaptureBehavior>,
    held: Mutex<Vec<HeldCapture>>,
    capture_requests: AtomicUsize,
    released_buffers: Arc<AtomicUsize>,
}

impl MockCamera {
    pub fn new(facing: CameraFacing, spec: MockCameraSpec) -> Self {
        Self {
            facing,
            spec,
            torch: AtomicBool::new(false),
            torch_failure: AtomicBool::new(false),
            torch_calls: Mutex::new(Vec::new()),
            exposure_index: Mutex::new(0),
            exposure_calls: Mutex::new(Vec::new()),
            zoom: Mutex::new(None),
            zoom_calls: Mutex::new(Vec::new()),
            focus_requests: Mutex::new(Vec::new()),
            focus_active: Arc::new(AtomicBool::new(false)),
            behavior: Mutex::new(CaptureBehavior::Succeed),
            held: Mutex::new(Vec::new()),
            capture_requests: AtomicUsize::new(0),
            released_buffers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_capture_behavior(&self, behavior: CaptureBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// Make torch switches fail while the flash unit stays reported
    pub fn set_torch_failure(&self, fail: bool) {
        self.torch_failure.store(fail, Ordering::SeqCst);
    }

    pub fn torch_enabled(&self) -> bool {
        self.torch.load(Ordering::SeqCst)
    }

    pub fn torch_calls(&self) -> Vec<bool> {
        self.torch_calls.lock().clone()
    }

    pub fn exposure_calls(&self) -> Vec<i32> {
        self.exposure_calls.lock().clone()
    }

    pub fn zoom_calls(&self) -> Vec<f32> {
        self.zoom_calls.lock().clone()
    }

    pub fn focus_requests(&self) -> Vec<FocusMeteringRequest> {
        self.focus_requests.lock().clone()
    }

    pub fn is_focus_active(&self) -> bool {
        self.focus_active.load(Ordering::SeqCst)
    }

    pub fn capture_requests(&self) -> usize {
        self.capture_requests.load(Ordering::SeqCst)
    }

    /// Buffers handed back through [`CapturedImage`] release
    pub fn released_buffers(&self) -> usize {
        self.released_buffers.load(Ordering::SeqCst)
    }

    pub fn held_captures(&self) -> usize {
        self.held.lock().len()
    }

    /// Deliver every held request as a successful still
    pub fn complete_held(&self) -> usize {
        let held: Vec<HeldCapture> = self.held.lock().drain(..).collect();
        let count = held.len();
        for capture in held {
            self.deliver_success(&capture.executor, capture.callback);
        }
        count
    }

    fn render_frame(&self) -> Result<CapturedImage, CaptureError> {
        let (width, height) = self.spec.frame_size;
        let shade = (self.capture_requests() % 256) as u8;
        let pattern = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                shade,
            ])
        });

        let mut data = Vec::new();
        JpegEncoder::new_with_quality(&mut data, 85)
            .encode_image(&DynamicImage::ImageRgb8(pattern))
            .map_err(|e| CaptureError::Hardware {
                details: format!("test pattern encoding failed: {}", e),
            })?;

        let released = Arc::clone(&self.released_buffers);
        Ok(CapturedImage::new(
            data,
            width,
            height,
            FrameFormat::Jpeg,
            self.spec.rotation_degrees,
        )
        .with_release_hook(move || {
            released.fetch_add(1, Ordering::SeqCst);
        }))
    }

    fn deliver_success(&self, executor: &WorkerHandle, callback: Box<dyn ImageCapturedCallback>) {
        match self.render_frame() {
            Ok(image) => {
                trace!("Mock camera delivering {:?}", image);
                if !executor.execute(move || callback.on_capture_success(image)) {
                    debug!("Mock camera executor refused capture result");
                }
            }
            Err(error) => {
                executor.execute(move || callback.on_error(error));
            }
        }
    }
}

#[async_trait]
impl Camera for MockCamera {
    fn facing(&self) -> CameraFacing {
        self.facing
    }

    fn has_flash_unit(&self) -> bool {
        self.spec.has_flash_unit
    }

    async fn enable_torch(&self, enabled: bool) -> Result<(), HardwareError> {
        if !self.spec.has_flash_unit {
            return Err(HardwareError::Unsupported {
                feature: "torch".to_string(),
            });
        }
        if self.torch_failure.load(Ordering::SeqCst) {
            return Err(HardwareError::Operation {
                details: "torch unavailable".to_string(),
            });
        }
        self.torch_calls.lock().push(enabled);
        self.torch.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    fn exposure_state(&self) -> ExposureState {
        let upper = self.spec.exposure_upper;
        ExposureState {
            range: -upper..=upper,
            index: *self.exposure_index.lock(),
            step: 1.0 / 3.0,
        }
    }

    async fn set_exposure_compensation_index(&self, index: i32) -> Result<i32, HardwareError> {
        let upper = self.spec.exposure_upper;
        if index < -upper || index > upper {
            return Err(HardwareError::OutOfRange {
                control: "exposure compensation".to_string(),
                value: index as f64,
                min: -upper as f64,
                max: upper as f64,
            });
        }
        self.exposure_calls.lock().push(index);
        *self.exposure_index.lock() = index;
        Ok(index)
    }

    fn zoom_ratio(&self) -> Option<f32> {
        *self.zoom.lock()
    }

    async fn set_zoom_ratio(&self, ratio: f32) -> Result<(), HardwareError> {
        if !(1.0..=self.spec.max_zoom).contains(&ratio) {
            return Err(HardwareError::OutOfRange {
                control: "zoom ratio".to_string(),
                value: ratio as f64,
                min: 1.0,
                max: self.spec.max_zoom as f64,
            });
        }
        self.zoom_calls.lock().push(ratio);
        *self.zoom.lock() = Some(ratio);
        Ok(())
    }

    async fn start_focus_and_metering(
        &self,
        request: FocusMeteringRequest,
    ) -> Result<FocusResult, HardwareError> {
        self.focus_active.store(true, Ordering::SeqCst);

        if let Some(delay) = request.auto_cancel {
            let focus_active = Arc::clone(&self.focus_active);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                focus_active.store(false, Ordering::SeqCst);
                trace!("Mock focus metering auto-cancelled");
            });
        }

        self.focus_requests.lock().push(request);
        Ok(FocusResult {
            focus_successful: true,
        })
    }

    fn take_picture(
        &self,
        settings: &CaptureSettings,
        executor: &WorkerHandle,
        callback: Box<dyn ImageCapturedCallback>,
    ) {
        self.capture_requests.fetch_add(1, Ordering::SeqCst);
        debug!(
            "Mock {} camera taking picture (rotation {}, {:?})",
            self.facing, settings.target_rotation, settings.mode
        );

        let behavior = self.behavior.lock().clone();
        match behavior {
            CaptureBehavior::Succeed => self.deliver_success(executor, callback),
            CaptureBehavior::Fail(error) => {
                executor.execute(move || callback.on_error(error));
            }
            CaptureBehavior::Hold => self.held.lock().push(HeldCapture {
                executor: executor.clone(),
                callback,
            }),
        }
    }
}

/// Simulated provider with a front and a back lens
pub struct MockCameraProvider {
    spec: MockCameraSpec,
    facings: Vec<CameraFacing>,
    bound: Mutex<Option<Arc<MockCamera>>>,
    bind_count: AtomicUsize,
    unbind_count: AtomicUsize,
}

impl MockCameraProvider {
    pub fn new(spec: MockCameraSpec) -> Self {
        Self::with_facings(spec, vec![CameraFacing::Back, CameraFacing::Front])
    }

    pub fn with_facings(spec: MockCameraSpec, facings: Vec<CameraFacing>) -> Self {
        Self {
            spec,
            facings,
            bound: Mutex::new(None),
            bind_count: AtomicUsize::new(0),
            unbind_count: AtomicUsize::new(0),
        }
    }

    /// The camera returned by the last successful bind, if still bound
    pub fn bound_camera(&self) -> Option<Arc<MockCamera>> {
        self.bound.lock().clone()
    }

    pub fn bind_count(&self) -> usize {
        self.bind_count.load(Ordering::SeqCst)
    }

    pub fn unbind_count(&self) -> usize {
        self.unbind_count.load(Ordering::SeqCst)
    }
}

impl Default for MockCameraProvider {
    fn default() -> Self {
        Self::new(MockCameraSpec::default())
    }
}

#[async_trait]
impl CameraProvider for MockCameraProvider {
    async fn bind(
        &self,
        facing: CameraFacing,
        preview: &PreviewSettings,
        capture: &CaptureSettings,
    ) -> Result<Arc<dyn Camera>, HardwareError> {
        if !self.has_camera(facing) {
            return Err(HardwareError::Bind {
                details: format!("no {} camera available", facing),
            });
        }

        info!(
            "Binding mock {} camera (preview {:?} @ {}, capture {:?})",
            facing, preview.aspect_ratio, preview.target_rotation, capture.mode
        );

        let camera = Arc::new(MockCamera::new(facing, self.spec.clone()));
        *self.bound.lock() = Some(Arc::clone(&camera));
        self.bind_count.fetch_add(1, Ordering::SeqCst);

        Ok(camera)
    }

    fn unbind_all(&self) {
        if self.bound.lock().take().is_some() {
            debug!("Unbound mock camera");
        }
        self.unbind_count.fetch_add(1, Ordering::SeqCst);
    }

    fn has_camera(&self, facing: CameraFacing) -> bool {
        self.facings.contains(&facing)
    }
}

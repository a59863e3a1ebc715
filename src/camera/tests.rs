use super::*;
use crate::error::{CaptureError, HardwareError};
use crate::frame::{CapturedImage, Rotation};
use crate::worker::CaptureWorker;
use std::sync::mpsc;
use std::time::Duration;

fn create_test_settings() -> (PreviewSettings, CaptureSettings) {
    (
        PreviewSettings {
            target_rotation: Rotation::Rotate0,
            aspect_ratio: AspectRatio::Ratio4x3,
        },
        CaptureSettings {
            target_rotation: Rotation::Rotate0,
            aspect_ratio: AspectRatio::Ratio4x3,
            mode: CaptureMode::MinimizeLatency,
        },
    )
}

struct ChannelCallback(mpsc::Sender<Result<CapturedImage, CaptureError>>);

impl ImageCapturedCallback for ChannelCallback {
    fn on_capture_success(self: Box<Self>, image: CapturedImage) {
        let _ = self.0.send(Ok(image));
    }

    fn on_error(self: Box<Self>, error: CaptureError) {
        let _ = self.0.send(Err(error));
    }
}

#[tokio::test]
async fn test_provider_binds_requested_facing() {
    let provider = MockCameraProvider::default();
    let (preview, capture) = create_test_settings();

    let camera = provider
        .bind(CameraFacing::Front, &preview, &capture)
        .await
        .unwrap();

    assert_eq!(camera.facing(), CameraFacing::Front);
    assert_eq!(provider.bind_count(), 1);
    assert!(provider.bound_camera().is_some());

    provider.unbind_all();
    assert!(provider.bound_camera().is_none());
    assert_eq!(provider.unbind_count(), 1);
}

#[tokio::test]
async fn test_provider_rejects_missing_lens() {
    let provider =
        MockCameraProvider::with_facings(MockCameraSpec::default(), vec![CameraFacing::Back]);
    let (preview, capture) = create_test_settings();

    let result = provider.bind(CameraFacing::Front, &preview, &capture).await;
    assert!(matches!(result, Err(HardwareError::Bind { .. })));
}

#[tokio::test]
async fn test_mock_zoom_range_is_enforced() {
    let camera = MockCamera::new(CameraFacing::Back, MockCameraSpec::default());

    assert_eq!(camera.zoom_ratio(), None);
    camera.set_zoom_ratio(2.0).await.unwrap();
    assert_eq!(camera.zoom_ratio(), Some(2.0));

    let err = camera.set_zoom_ratio(20.0).await.unwrap_err();
    assert!(matches!(err, HardwareError::OutOfRange { .. }));
    assert_eq!(camera.zoom_ratio(), Some(2.0));
}

#[tokio::test]
async fn test_mock_without_flash_rejects_torch() {
    let spec = MockCameraSpec {
        has_flash_unit: false,
        ..MockCameraSpec::default()
    };
    let camera = MockCamera::new(CameraFacing::Back, spec);

    assert!(camera.enable_torch(true).await.is_err());
    assert!(!camera.torch_enabled());
}

#[tokio::test(start_paused = true)]
async fn test_mock_focus_auto_cancels() {
    let camera = MockCamera::new(CameraFacing::Back, MockCameraSpec::default());
    let request = FocusMeteringRequest::af_ae(MeteringPoint::center(), Duration::from_secs(5));

    let result = camera.start_focus_and_metering(request).await.unwrap();
    assert!(result.focus_successful);
    assert!(camera.is_focus_active());

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(!camera.is_focus_active());
}

#[test]
fn test_mock_capture_delivers_on_executor() {
    let worker = CaptureWorker::spawn("mock-capture").unwrap();
    let camera = MockCamera::new(
        CameraFacing::Back,
        MockCameraSpec {
            frame_size: (64, 48),
            ..MockCameraSpec::default()
        },
    );
    let (_, capture) = create_test_settings();
    let (tx, rx) = mpsc::channel();

    camera.take_picture(&capture, &worker.handle(), Box::new(ChannelCallback(tx)));

    let image = rx.recv_timeout(Duration::from_secs(2)).unwrap().unwrap();
    assert_eq!((image.width(), image.height()), (64, 48));
    assert_eq!(image.rotation_degrees(), 90);

    image.close();
    assert_eq!(camera.released_buffers(), 1);
}

#[test]
fn test_mock_capture_failure() {
    let worker = CaptureWorker::spawn("mock-capture").unwrap();
    let camera = MockCamera::new(CameraFacing::Back, MockCameraSpec::default());
    camera.set_capture_behavior(CaptureBehavior::Fail(CaptureError::CameraClosed));
    let (_, capture) = create_test_settings();
    let (tx, rx) = mpsc::channel();

    camera.take_picture(&capture, &worker.handle(), Box::new(ChannelCallback(tx)));

    let outcome = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(outcome.unwrap_err(), CaptureError::CameraClosed);
}

#[test]
fn test_mock_held_capture_completes_later() {
    let worker = CaptureWorker::spawn("mock-capture").unwrap();
    let camera = MockCamera::new(
        CameraFacing::Back,
        MockCameraSpec {
            frame_size: (16, 16),
            ..MockCameraSpec::default()
        },
    );
    camera.set_capture_behavior(CaptureBehavior::Hold);
    let (_, capture) = create_test_settings();
    let (tx, rx) = mpsc::channel();

    camera.take_picture(&capture, &worker.handle(), Box::new(ChannelCallback(tx)));
    assert_eq!(camera.held_captures(), 1);
    assert!(rx.try_recv().is_err());

    assert_eq!(camera.complete_held(), 1);
    assert!(rx.recv_timeout(Duration::from_secs(2)).unwrap().is_ok());
}

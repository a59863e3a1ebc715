use super::*;
use crate::camera::{Camera, CameraFacing, CameraState, MockCameraSpec};
use crate::config::ViewfinderConfig;
use crate::events::ViewfinderEvent;
use crate::feedback::RingerMode;
use crate::frame::Rotation;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn create_test_config(dir: &tempfile::TempDir) -> ViewfinderConfig {
    let mut config = ViewfinderConfig::default();
    config.capture.path = dir.path().join("pictures").display().to_string();
    config.feedback.shutter_sound = false;
    config
}

fn test_spec() -> MockCameraSpec {
    MockCameraSpec {
        frame_size: (64, 48),
        ..MockCameraSpec::default()
    }
}

fn create_app(dir: &tempfile::TempDir) -> ViewfinderApp {
    ViewfinderApp::with_camera(create_test_config(dir), Rotation::Rotate0, test_spec()).unwrap()
}

fn saved_pictures(dir: &tempfile::TempDir) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(dir.path().join("pictures")) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map_or(false, |ext| ext == "jpg"))
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn test_start_binds_default_facing() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = create_app(&dir);

    app.start().await.unwrap();

    assert_eq!(app.current_facing(), Some(CameraFacing::Back));
    assert_eq!(app.provider().bind_count(), 1);
    let camera = app.view_model().camera().unwrap();
    assert_eq!(camera.facing(), CameraFacing::Back);
    assert_eq!(
        app.view_model().state().state(),
        Some(CameraState::Live)
    );
}

#[tokio::test]
async fn test_flip_rebinds_camera() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = create_app(&dir);
    app.start().await.unwrap();

    assert!(app.handle_action(UserAction::FlipCamera).await.unwrap());

    assert_eq!(app.current_facing(), Some(CameraFacing::Front));
    let bound = app.provider().bound_camera().unwrap();
    assert_eq!(bound.facing(), CameraFacing::Front);
    assert_eq!(app.provider().bind_count(), 2);
}

#[tokio::test]
async fn test_torch_follows_flash_state_across_flip() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = create_app(&dir);
    app.start().await.unwrap();

    app.handle_action(UserAction::ToggleFlash).await.unwrap();
    assert!(app.provider().bound_camera().unwrap().torch_enabled());

    app.handle_action(UserAction::FlipCamera).await.unwrap();

    assert_eq!(app.view_model().state().flash_on.get(), Some(true));
    assert!(app.provider().bound_camera().unwrap().torch_enabled());
}

#[tokio::test]
async fn test_exposure_steps_are_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = create_app(&dir);
    app.start().await.unwrap();

    for _ in 0..8 {
        app.handle_action(UserAction::ExposureUp).await.unwrap();
    }

    let camera = app.provider().bound_camera().unwrap();
    assert_eq!(camera.exposure_calls().last(), Some(&12));
    assert!((app.exposure - 1.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_cycle_ringer() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = create_app(&dir);

    app.handle_action(UserAction::CycleRinger).await.unwrap();
    assert_eq!(app.ringer_mode(), RingerMode::Vibrate);
    app.handle_action(UserAction::CycleRinger).await.unwrap();
    assert_eq!(app.ringer_mode(), RingerMode::Silent);
}

#[tokio::test]
async fn test_quit_stops_loop() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = create_app(&dir);

    assert!(!app.handle_action(UserAction::Quit).await.unwrap());
}

#[tokio::test]
async fn test_run_until_shutdown_processes_actions() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = create_app(&dir);
    app.start().await.unwrap();

    let (tx, rx) = mpsc::channel(8);
    tx.send(UserAction::ZoomIn).await.unwrap();
    tx.send(UserAction::FocusCenter).await.unwrap();
    tx.send(UserAction::Quit).await.unwrap();

    let reason = timeout(Duration::from_secs(5), app.run_until_shutdown(rx))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(reason, ShutdownReason::UserRequest);
    let camera = app.provider().bound_camera().unwrap();
    assert_eq!(camera.zoom_calls(), vec![1.25]);
    assert_eq!(camera.focus_requests().len(), 1);
}

#[tokio::test]
async fn test_closed_input_ends_loop() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = create_app(&dir);

    let (tx, rx) = mpsc::channel(1);
    drop(tx);

    let reason = app.run_until_shutdown(rx).await.unwrap();
    assert_eq!(reason, ShutdownReason::InputClosed);
}

#[tokio::test]
async fn test_script_captures_and_saves() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = create_app(&dir);

    let exit_code = app.run_script().await.unwrap();

    assert_eq!(exit_code, 0);
    assert_eq!(saved_pictures(&dir).len(), 1);
    assert!(app.view_model().is_destroyed());
    assert_eq!(app.provider().unbind_count(), 2);
}

#[tokio::test]
async fn test_failed_capture_saves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = create_app(&dir);
    app.start().await.unwrap();

    let camera = app.provider().bound_camera().unwrap();
    camera.set_capture_behavior(crate::camera::CaptureBehavior::Fail(
        crate::error::CaptureError::CameraClosed,
    ));
    let mut events = app.view_model().event_bus().subscribe();

    app.handle_action(UserAction::TakePicture).await.unwrap();

    let event = timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            if let ViewfinderEvent::CaptureFailed { .. } = event {
                return event;
            }
        }
    })
    .await
    .unwrap();
    assert!(matches!(event, ViewfinderEvent::CaptureFailed { .. }));
    assert!(saved_pictures(&dir).is_empty());
}

#[test]
fn test_shutdown_reason_descriptions() {
    assert_eq!(
        ShutdownReason::Signal("SIGTERM".to_string()).describe(),
        "Received SIGTERM"
    );
    assert!(ShutdownReason::UserRequest.describe().contains("keyboard"));
}

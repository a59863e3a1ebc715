pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod events;
pub mod feedback;
pub mod frame;
pub mod keyboard_input;
pub mod observable;
pub mod storage;
pub mod viewmodel;
pub mod worker;

pub use app::{ShutdownReason, UserAction, ViewfinderApp};
pub use camera::{
    Camera, CameraFacing, CameraProvider, CameraState, ImageCapturedCallback, MeteringPoint,
    MockCamera, MockCameraProvider,
};
pub use config::ViewfinderConfig;
pub use error::{Result, ViewfinderError};
pub use events::{EventBus, EventFilter, EventReceiver, ViewfinderEvent};
pub use feedback::{AudioService, Feedback, RingerMode, ShutterSound, Vibrator};
pub use frame::{CapturedImage, FrameFormat, Picture, Rotation};
pub use observable::Observable;
pub use storage::{FileImageRepository, ImageRepository, SaveImageUseCase, SavedPicture};
pub use viewmodel::{
    AcceptAction, CaptureViewModel, CaptureViewModelBuilder, PictureHandler, ViewState,
};
pub use worker::{CaptureWorker, WorkerHandle};

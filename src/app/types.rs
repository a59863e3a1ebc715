/// User intents fed into the application loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    TakePicture,
    Accept,
    Discard,
    FlipCamera,
    ToggleFlash,
    ZoomIn,
    ZoomOut,
    ExposureUp,
    ExposureDown,
    FocusCenter,
    CycleRinger,
    Quit,
}

/// Why the application loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    Signal(String),
    UserRequest,
    InputClosed,
}

impl ShutdownReason {
    pub fn describe(&self) -> String {
        match self {
            ShutdownReason::Signal(name) => format!("Received {}", name),
            ShutdownReason::UserRequest => "User requested via keyboard".to_string(),
            ShutdownReason::InputClosed => "Input handler stopped".to_string(),
        }
    }
}

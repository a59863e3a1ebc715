use crate::app::UserAction;
use crate::error::{Result, ViewfinderError};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Map a key press onto a viewfinder action
pub fn action_for_key(code: KeyCode) -> Option<UserAction> {
    match code {
        KeyCode::Char(' ') | KeyCode::Enter => Some(UserAction::TakePicture),
        KeyCode::Char('a') => Some(UserAction::Accept),
        KeyCode::Char('x') | KeyCode::Backspace => Some(UserAction::Discard),
        KeyCode::Char('f') => Some(UserAction::FlipCamera),
        KeyCode::Char('t') => Some(UserAction::ToggleFlash),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(UserAction::ZoomIn),
        KeyCode::Char('-') => Some(UserAction::ZoomOut),
        KeyCode::Char(']') => Some(UserAction::ExposureUp),
        KeyCode::Char('[') => Some(UserAction::ExposureDown),
        KeyCode::Char('c') => Some(UserAction::FocusCenter),
        KeyCode::Char('m') => Some(UserAction::CycleRinger),
        KeyCode::Char('q') | KeyCode::Esc => Some(UserAction::Quit),
        _ => None,
    }
}

/// Keyboard input handler feeding viewfinder actions
pub struct KeyboardInputHandler {
    actions: mpsc::Sender<UserAction>,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    pub fn new(actions: mpsc::Sender<UserAction>) -> Self {
        Self {
            actions,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for key presses on a blocking thread
    pub fn start(&self) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(ViewfinderError::component(
                "keyboard",
                "handler already stopped",
            ));
        }

        info!("Starting keyboard input handler");

        let actions = self.actions.clone();
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            debug!("Raw mode enabled - keyboard handler active");

            while !cancellation_token.is_cancelled() {
                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }

                        let Some(action) = action_for_key(key_event.code) else {
                            debug!("Unmapped key: {:?}", key_event.code);
                            continue;
                        };

                        if actions.blocking_send(action).is_err() {
                            debug!("Action receiver dropped, stopping keyboard handler");
                            break;
                        }
                        if action == UserAction::Quit {
                            break;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }

            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop the handler and restore the terminal
    pub async fn stop(&self) {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Give the blocking task a poll interval to restore the terminal
        tokio::time::sleep(Duration::from_millis(200)).await;

        let _ = disable_raw_mode();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}

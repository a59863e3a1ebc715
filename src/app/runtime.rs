use super::{ShutdownReason, UserAction, ViewfinderApp};
use crate::error::{Result, ViewfinderError};
use crate::events::{EventFilter, ViewfinderEvent};
use crate::keyboard_input::KeyboardInputHandler;
use std::time::{Duration, SystemTime};
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tracing::{error, info, warn};

const SCRIPT_STEP_TIMEOUT: Duration = Duration::from_secs(10);

impl ViewfinderApp {
    /// Run the interactive loop until the user quits or a signal arrives
    pub async fn run(&mut self) -> Result<i32> {
        self.start().await?;

        let (action_tx, action_rx) = mpsc::channel(32);
        let keyboard = KeyboardInputHandler::new(action_tx);
        keyboard.start()?;

        let reason = self.run_until_shutdown(action_rx).await;
        keyboard.stop().await;

        let exit_code = match reason {
            Ok(reason) => {
                info!("Shutdown initiated: {}", reason.describe());
                self.publish_shutdown(&reason);
                0
            }
            Err(e) => {
                error!("Viewfinder loop failed: {}", e);
                1
            }
        };

        self.shutdown();
        Ok(exit_code)
    }

    /// Drive the app from an action channel until it asks to stop
    pub async fn run_until_shutdown(
        &mut self,
        mut actions: mpsc::Receiver<UserAction>,
    ) -> Result<ShutdownReason> {
        let mut outcomes = self.view_model.event_bus().subscribe_filtered(
            EventFilter::EventTypes(vec![
                "picture_captured",
                "capture_failed",
                "picture_accepted",
                "accept_failed",
            ]),
            "viewfinder-app",
        );

        let signal = wait_for_signal();
        tokio::pin!(signal);

        info!("Viewfinder running: space=capture a=accept x=discard f=flip t=torch +/- zoom [ ] exposure c=focus m=ringer q=quit");

        loop {
            tokio::select! {
                action = actions.recv() => {
                    let Some(action) = action else {
                        return Ok(ShutdownReason::InputClosed);
                    };
                    if !self.handle_action(action).await? {
                        return Ok(ShutdownReason::UserRequest);
                    }
                }
                outcome = outcomes.recv() => {
                    match outcome {
                        Ok(event) => info!("{}", event.description()),
                        Err(e) => warn!("Missed view-model outcome: {}", e),
                    }
                }
                reason = &mut signal => {
                    return Ok(reason);
                }
            }
        }
    }

    /// Take one picture, accept it and exit
    pub async fn run_script(&mut self) -> Result<i32> {
        self.start().await?;
        let mut events = self.view_model.event_bus().subscribe();

        self.handle_action(UserAction::TakePicture).await?;
        let captured = wait_for_outcome(&mut events, |e| {
            matches!(
                e,
                ViewfinderEvent::PictureCaptured { .. } | ViewfinderEvent::CaptureFailed { .. }
            )
        })
        .await?;
        info!("{}", captured.description());

        let exit_code = if let ViewfinderEvent::CaptureFailed { .. } = captured {
            1
        } else {
            self.handle_action(UserAction::Accept).await?;
            let accepted = wait_for_outcome(&mut events, |e| {
                matches!(
                    e,
                    ViewfinderEvent::PictureAccepted { .. } | ViewfinderEvent::AcceptFailed { .. }
                )
            })
            .await?;
            info!("{}", accepted.description());

            match accepted {
                ViewfinderEvent::PictureAccepted { path: Some(path), .. } => {
                    println!("{}", path.display());
                    0
                }
                ViewfinderEvent::PictureAccepted { path: None, .. } => 0,
                _ => 1,
            }
        };

        self.shutdown();
        Ok(exit_code)
    }

    /// Release the view-model and its camera
    pub fn shutdown(&self) {
        info!("Shutting down viewfinder");
        self.view_model.on_destroy();
    }

    fn publish_shutdown(&self, reason: &ShutdownReason) {
        self.view_model
            .event_bus()
            .emit(ViewfinderEvent::ShutdownRequested {
                timestamp: SystemTime::now(),
                reason: reason.describe(),
            });
    }
}

async fn wait_for_outcome<F>(
    events: &mut broadcast::Receiver<ViewfinderEvent>,
    predicate: F,
) -> Result<ViewfinderEvent>
where
    F: Fn(&ViewfinderEvent) -> bool,
{
    let wait = async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return Ok(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Script lagged behind by {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(ViewfinderError::system("Event bus closed"));
                }
            }
        }
    };

    timeout(SCRIPT_STEP_TIMEOUT, wait)
        .await
        .map_err(|_| ViewfinderError::system("Timed out waiting for view-model outcome"))?
}

async fn wait_for_signal() -> ShutdownReason {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => return ShutdownReason::Signal("SIGTERM".to_string()),
                    _ = tokio::signal::ctrl_c() => return ShutdownReason::Signal("SIGINT".to_string()),
                }
            }
            Err(e) => warn!("Failed to register SIGTERM handler: {}", e),
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => ShutdownReason::Signal("SIGINT".to_string()),
        Err(e) => {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending().await
        }
    }
}

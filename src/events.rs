use crate::camera::CameraFacing;
use crate::error::EventBusError;
use crate::frame::Rotation;
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcomes announced by the capture view-model
#[derive(Debug, Clone, PartialEq)]
pub enum ViewfinderEvent {
    /// Preview and capture settings were (re)built
    CameraStarted {
        rotation: Rotation,
        timestamp: SystemTime,
    },
    /// A camera handle was bound and injected
    CameraBound { facing: CameraFacing },
    /// The user flipped the lens
    FacingChanged { facing: CameraFacing },
    /// The torch was switched on or off
    TorchChanged { enabled: bool },
    /// A still was decoded and published
    PictureCaptured {
        picture_id: Uuid,
        width: u32,
        height: u32,
    },
    /// The hardware or decoder reported a failed still
    CaptureFailed { error: String },
    /// The captured still was thrown away
    PictureDiscarded { picture_id: Option<Uuid> },
    /// The captured still was handed to the accept action
    PictureAccepted {
        picture_id: Uuid,
        path: Option<PathBuf>,
    },
    /// The accept action failed; the still is kept
    AcceptFailed { picture_id: Uuid, error: String },
    /// Shutdown requested by the user or the host
    ShutdownRequested {
        timestamp: SystemTime,
        reason: String,
    },
}

impl ViewfinderEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            ViewfinderEvent::CameraStarted { rotation, .. } => {
                format!("Camera started with target rotation {}", rotation)
            }
            ViewfinderEvent::CameraBound { facing } => format!("Bound {} camera", facing),
            ViewfinderEvent::FacingChanged { facing } => format!("Facing changed to {}", facing),
            ViewfinderEvent::TorchChanged { enabled } => {
                format!("Torch {}", if *enabled { "on" } else { "off" })
            }
            ViewfinderEvent::PictureCaptured {
                picture_id,
                width,
                height,
            } => format!("Picture {} captured ({}x{})", picture_id, width, height),
            ViewfinderEvent::CaptureFailed { error } => format!("Capture failed: {}", error),
            ViewfinderEvent::PictureDiscarded { picture_id } => match picture_id {
                Some(id) => format!("Picture {} discarded", id),
                None => "Returned to live preview".to_string(),
            },
            ViewfinderEvent::PictureAccepted { picture_id, path } => match path {
                Some(path) => format!("Picture {} accepted ({})", picture_id, path.display()),
                None => format!("Picture {} accepted", picture_id),
            },
            ViewfinderEvent::AcceptFailed { picture_id, error } => {
                format!("Accepting picture {} failed: {}", picture_id, error)
            }
            ViewfinderEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            ViewfinderEvent::CameraStarted { .. } => "camera_started",
            ViewfinderEvent::CameraBound { .. } => "camera_bound",
            ViewfinderEvent::FacingChanged { .. } => "facing_changed",
            ViewfinderEvent::TorchChanged { .. } => "torch_changed",
            ViewfinderEvent::PictureCaptured { .. } => "picture_captured",
            ViewfinderEvent::CaptureFailed { .. } => "capture_failed",
            ViewfinderEvent::PictureDiscarded { .. } => "picture_discarded",
            ViewfinderEvent::PictureAccepted { .. } => "picture_accepted",
            ViewfinderEvent::AcceptFailed { .. } => "accept_failed",
            ViewfinderEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Event bus for view-model outcomes using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<ViewfinderEvent>,
    debug_logging: bool,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: false,
        }
    }

    /// Create a new event bus with debug logging enabled
    pub fn with_debug_logging(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: true,
        }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<ViewfinderEvent> {
        self.sender.subscribe()
    }

    /// Subscribe with a filter applied on receive
    pub fn subscribe_filtered(&self, filter: EventFilter, name: &str) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), filter, name.to_string())
    }

    /// Publish an event to all subscribers.
    ///
    /// Callable from the capture worker thread; publishing never blocks.
    pub fn publish(&self, event: ViewfinderEvent) -> Result<usize, EventBusError> {
        if self.debug_logging {
            debug!("Publishing event: {}", event.description());
        }

        match &event {
            ViewfinderEvent::PictureCaptured { .. } | ViewfinderEvent::PictureAccepted { .. } => {
                info!("{}", event.description());
            }
            ViewfinderEvent::AcceptFailed { .. } => {
                warn!("{}", event.description());
            }
            ViewfinderEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => {}
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Publish, ignoring the absence of subscribers
    pub fn emit(&self, event: ViewfinderEvent) {
        if let Err(e) = self.publish(event) {
            debug!("Event dropped: {}", e);
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if there are any active subscribers
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            debug_logging: self.debug_logging,
        }
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
    /// Custom filter function
    Custom(fn(&ViewfinderEvent) -> bool),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &ViewfinderEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
            EventFilter::Custom(filter_fn) => filter_fn(event),
        }
    }
}

/// Event receiver with filtering
pub struct EventReceiver {
    receiver: broadcast::Receiver<ViewfinderEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    pub fn new(
        receiver: broadcast::Receiver<ViewfinderEvent>,
        filter: EventFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next event passing the filter
    pub async fn recv(&mut self) -> Result<ViewfinderEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, skipped);
                    return Err(EventBusError::Lagged { skipped });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<Option<ViewfinderEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, skipped);
                    return Err(EventBusError::Lagged { skipped });
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}

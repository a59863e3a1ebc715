use super::accept::AcceptAction;
use super::model::CaptureViewModel;
use crate::config::ViewfinderConfig;
use crate::error::{Result, ViewfinderError};
use crate::events::EventBus;
use crate::feedback::Feedback;
use crate::storage::SaveImageUseCase;

/// Builder for the capture view-model
pub struct CaptureViewModelBuilder {
    config: Option<ViewfinderConfig>,
    feedback: Option<Feedback>,
    accept_action: Option<AcceptAction>,
    event_bus: Option<EventBus>,
}

impl CaptureViewModelBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            feedback: None,
            accept_action: None,
            event_bus: None,
        }
    }

    pub fn config(mut self, config: ViewfinderConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn feedback(mut self, feedback: Feedback) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn accept_action(mut self, action: AcceptAction) -> Self {
        self.accept_action = Some(action);
        self
    }

    pub fn event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Build the view-model. Without explicit collaborators, feedback is
    /// silent, accepted pictures are saved under `capture.path` and a new
    /// event bus is created.
    pub fn build(self) -> Result<CaptureViewModel> {
        let config = self
            .config
            .ok_or_else(|| ViewfinderError::system("View-model configuration must be specified"))?;
        config.validate()?;

        let feedback = self.feedback.unwrap_or_else(Feedback::silent);
        let accept_action = self
            .accept_action
            .unwrap_or_else(|| AcceptAction::Persist(SaveImageUseCase::to_directory(&config.capture)));
        let event_bus = self
            .event_bus
            .unwrap_or_else(|| EventBus::new(config.system.event_bus_capacity));

        CaptureViewModel::new(&config, feedback, accept_action, event_bus)
    }
}

impl Default for CaptureViewModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

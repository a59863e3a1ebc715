use crate::error::Result;
use crate::frame::Picture;
use crate::storage::SaveImageUseCase;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Caller-supplied handling of an accepted picture
#[async_trait]
pub trait PictureHandler: Send + Sync {
    /// Returns the location the picture ended up at, if any
    async fn handle(&self, picture: &Picture) -> Result<Option<PathBuf>>;
}

/// What accepting a captured picture does
#[derive(Clone)]
pub enum AcceptAction {
    /// Persist through the save use case, then leave the capture screen
    Persist(SaveImageUseCase),
    /// Hand the picture to a custom handler
    Custom(Arc<dyn PictureHandler>),
}

impl AcceptAction {
    pub(crate) async fn run(&self, picture: &Picture) -> Result<Option<PathBuf>> {
        match self {
            AcceptAction::Persist(use_case) => {
                let saved = use_case.execute(picture).await?;
                Ok(Some(saved.path))
            }
            AcceptAction::Custom(handler) => handler.handle(picture).await,
        }
    }
}

impl fmt::Debug for AcceptAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptAction::Persist(_) => write!(f, "AcceptAction::Persist"),
            AcceptAction::Custom(_) => write!(f, "AcceptAction::Custom"),
        }
    }
}

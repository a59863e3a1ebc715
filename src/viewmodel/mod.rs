mod accept;
mod builder;
mod capture;
mod model;
mod scope;
mod state;

pub use accept::{AcceptAction, PictureHandler};
pub use builder::CaptureViewModelBuilder;
pub use model::CaptureViewModel;
pub use state::{ViewState, ViewStateSnapshot};

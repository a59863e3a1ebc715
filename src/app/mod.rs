mod orchestrator;
mod runtime;
mod types;

#[cfg(test)]
mod tests;

pub use orchestrator::ViewfinderApp;
pub use types::{ShutdownReason, UserAction};

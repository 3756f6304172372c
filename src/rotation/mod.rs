//! Timed view rotation with pause/resume driven by an editing surface.

mod config;
mod core;
mod scheduler;
mod state;

pub use config::RotationConfig;
pub use core::View;
pub use scheduler::{EditingHandle, RotationScheduler};
pub use state::{RotationReceiver, RotationUpdate};

#[cfg(test)]
mod tests;

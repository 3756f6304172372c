//! Goal-progress classification and the cues driven by level transitions.

mod config;
mod core;
mod engine;
mod state;
mod summary;

pub use config::AlertConfig;
pub use core::{AlertLevel, AlertThresholds, AudioCue, classify};
pub use engine::AlertEngine;
pub use state::{AlertReceiver, AlertUpdate};
pub use summary::TeamGoalSummary;

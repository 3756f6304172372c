//! Self-healing periodic reload with cooldown and visibility guards.

mod config;
pub(crate) mod error;
mod watchdog;

pub use config::{
    ENV_AUTO_RELOAD_ENABLED, ENV_AUTO_RELOAD_MS, ENV_AUTO_RELOAD_PAUSE_WHEN_HIDDEN, ReloadConfig,
    ReloadInterval,
};
pub use watchdog::{
    ReloadHandler, ReloadOutcome, ReloadReceiver, ReloadUpdate, ReloadWatchdog, Visibility,
};

#[cfg(test)]
mod tests;

//! Live data synchronization.
//!
//! A [`SyncEngine`] owns a set of named topics. Each topic pairs a [`TopicFetcher`] with a
//! change-notification channel opened through a [`ChangeSource`]. Whenever the channel reports a
//! change, the full snapshot is refetched and published to [`SyncReader`] subscribers. Fetches
//! for the same topic never overlap: notifications arriving while a fetch is in flight collapse
//! into a single trailing refresh.

mod config;
mod core;
mod engine;
pub(crate) mod error;
pub(crate) mod process;
mod source;
mod state;

pub use config::SyncConfig;
pub use core::{FnFetcher, Snapshot, TopicFetcher, TopicName, fetcher_fn};
pub use engine::{SyncController, SyncEngine};
pub use source::{ChangeKind, ChangeReceiver, ChangeSource, LocalChangeHub};
pub use state::{SyncReader, SyncReceiver, SyncUpdate, TopicSnapshot, TopicStatus};

#[cfg(test)]
mod tests;

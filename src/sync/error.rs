use std::result;

use thiserror::Error;
use tokio::{sync::broadcast::error::SendError, task::JoinError};

use super::core::TopicName;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SyncError {
    #[error("Topic `{0}` is already registered")]
    DuplicateTopic(TopicName),

    #[error("Sync already shutdown error")]
    SyncAlreadyShutdown,

    #[error("Failed to send sync shutdown signal error: {0}")]
    SendShutdownSignalFailed(SendError<()>),

    #[error("[TopicTaskJoin] topic `{topic}`: {source}")]
    TopicTaskJoin {
        topic: TopicName,
        #[source]
        source: JoinError,
    },

    #[error("Sync shutdown timeout error")]
    ShutdownTimeout,
}

pub type Result<T> = result::Result<T, SyncError>;

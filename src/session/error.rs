use std::result;

use thiserror::Error;
use tokio::{sync::broadcast::error::SendError, task::JoinError};

use crate::sync::{TopicName, error::SyncError};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SessionError {
    #[error("Topic registration failed: {0}")]
    TopicRegistration(SyncError),

    #[error("A goal topic is already registered: `{0}`")]
    GoalTopicAlreadyRegistered(TopicName),

    #[error("Session already shutdown error")]
    SessionAlreadyShutdown,

    #[error("Sync shutdown failed: {0}")]
    SyncShutdownFailed(SyncError),

    #[error("Failed to send session shutdown signal error: {0}")]
    SendShutdownSignalFailed(SendError<()>),

    #[error("[ProcessTaskJoin] {0}")]
    ProcessTaskJoin(JoinError),

    #[error("Session shutdown timeout error")]
    ShutdownTimeout,
}

pub type Result<T> = result::Result<T, SessionError>;

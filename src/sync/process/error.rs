use std::result;

use thiserror::Error;
use tokio::task::JoinError;

use crate::util::PanicPayload;

/// Failure of a single refresh. The topic keeps its last snapshot and waits for the next change
/// notification.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TopicProcessRecoverableError {
    #[error("`TopicFetcher::fetch` panicked: {0}")]
    FetchPanicked(PanicPayload),

    #[error("`TopicFetcher::fetch` error: {0}")]
    FetchFailed(String),

    #[error("[FetchTaskJoin] {0}")]
    FetchTaskJoin(JoinError),
}

pub(crate) type TopicRecoverableResult<T> = result::Result<T, TopicProcessRecoverableError>;

/// Loss of the change-notification channel. The topic keeps its last snapshot but can only be
/// refreshed again by restarting the session.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TopicProcessFatalError {
    #[error("Failed to open change-notification channel: {0}")]
    SubscriptionOpenFailed(String),

    #[error("Change-notification channel closed")]
    SubscriptionChannelClosed,
}

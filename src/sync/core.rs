use std::{
    borrow::Borrow,
    fmt,
    future::Future,
    marker::PhantomData,
    panic::AssertUnwindSafe,
    sync::Arc,
};

use async_trait::async_trait;
use futures::FutureExt;

use crate::error::BoxError;

use super::process::error::{TopicProcessRecoverableError, TopicRecoverableResult};

/// Marker trait for values that can be published by a topic.
///
/// This trait bundles the constraints required for snapshot types:
/// - `Send + Sync`: Shared across tasks behind an `Arc`
/// - `Debug`: Can be formatted for logging
/// - `'static`: No borrowed references
///
/// A blanket implementation is provided for all types meeting these constraints, so this trait
/// doesn't need to be implemented manually. Snapshots are never mutated after being fetched, so
/// `Clone` is not required: consumers receive an `Arc<T>`.
pub trait Snapshot: Send + Sync + fmt::Debug + 'static {}

impl<T> Snapshot for T where T: Send + Sync + fmt::Debug + 'static {}

/// Unique name of a live data feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicName(Arc<str>);

impl TopicName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TopicName {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for TopicName {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl Borrow<str> for TopicName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Retrieval function of a topic.
///
/// Implementations query the backing store and return the complete current snapshot. They must
/// be safe to call repeatedly; the synchronization layer guarantees that calls for the same topic
/// never overlap.
///
/// # Example
///
/// ```
/// use lobbyboard::{
///     error::BoxError,
///     models::ProposalCard,
///     sync::TopicFetcher,
/// };
///
/// pub struct PendingCardsFetcher;
///
/// #[async_trait::async_trait]
/// impl TopicFetcher<Vec<ProposalCard>> for PendingCardsFetcher {
///     async fn fetch(&self) -> Result<Vec<ProposalCard>, BoxError> {
///         // Query the store...
///         Ok(Vec::new())
///     }
/// }
/// ```
#[async_trait]
pub trait TopicFetcher<T: Snapshot>: Send + Sync {
    /// Returns the current snapshot of the topic or fails.
    async fn fetch(&self) -> Result<T, BoxError>;
}

/// [`TopicFetcher`] backed by an async closure. Built with [`fetcher_fn`].
pub struct FnFetcher<T, F> {
    f: F,
    _snapshot: PhantomData<fn() -> T>,
}

/// Wraps an async closure as a [`TopicFetcher`].
///
/// ```
/// use lobbyboard::sync::fetcher_fn;
///
/// let fetcher = fetcher_fn(|| async { Ok::<_, lobbyboard::error::BoxError>(vec![1, 2, 3]) });
/// # let _ = fetcher;
/// ```
pub fn fetcher_fn<T, F, Fut>(f: F) -> FnFetcher<T, F>
where
    T: Snapshot,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
{
    FnFetcher {
        f,
        _snapshot: PhantomData,
    }
}

#[async_trait]
impl<T, F, Fut> TopicFetcher<T> for FnFetcher<T, F>
where
    T: Snapshot,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
{
    async fn fetch(&self) -> Result<T, BoxError> {
        (self.f)().await
    }
}

/// Internal wrapper that provides panic protection for topic fetchers.
pub(crate) struct WrappedTopicFetcher<T: Snapshot>(Arc<dyn TopicFetcher<T>>);

impl<T: Snapshot> WrappedTopicFetcher<T> {
    pub fn new(fetcher: Arc<dyn TopicFetcher<T>>) -> Self {
        Self(fetcher)
    }

    /// Fetches a snapshot with panic protection.
    pub async fn fetch(&self) -> TopicRecoverableResult<T> {
        FutureExt::catch_unwind(AssertUnwindSafe(self.0.fetch()))
            .await
            .map_err(|e| TopicProcessRecoverableError::FetchPanicked(e.into()))?
            .map_err(|e| TopicProcessRecoverableError::FetchFailed(e.to_string()))
    }
}

impl<T: Snapshot> Clone for WrappedTopicFetcher<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

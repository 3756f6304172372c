use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::BoxError;

use super::core::TopicName;

/// Kind of change reported by the backing store.
///
/// Carried for logging only: the synchronization layer always reacts by refetching the full
/// snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    Unknown,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Receiving end of a topic's change-notification channel.
///
/// A `Lagged` error only means several notifications were collapsed, which the synchronization
/// layer treats as a single change. `Closed` means the channel dropped and the topic can no
/// longer be refreshed until the session restarts.
pub type ChangeReceiver = broadcast::Receiver<ChangeKind>;

/// External facility delivering "something changed" notifications per topic.
///
/// Dropping the returned [`ChangeReceiver`] unsubscribes.
#[async_trait]
pub trait ChangeSource: Send + Sync {
    /// Opens the change-notification channel of `topic`.
    async fn open(&self, topic: &TopicName) -> Result<ChangeReceiver, BoxError>;
}

/// In-process [`ChangeSource`] where notifications are published with [`notify`].
///
/// Useful when the backing store's notifications are received by another component of the same
/// process (e.g. a database listener task), and in tests.
///
/// [`notify`]: LocalChangeHub::notify
#[derive(Debug)]
pub struct LocalChangeHub {
    capacity: usize,
    channels: Mutex<HashMap<TopicName, broadcast::Sender<ChangeKind>>>,
}

impl LocalChangeHub {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        })
    }

    fn lock_channels(&self) -> MutexGuard<'_, HashMap<TopicName, broadcast::Sender<ChangeKind>>> {
        self.channels
            .lock()
            .expect("`LocalChangeHub` mutex can't be poisoned")
    }

    /// Publishes a change of `topic`. Returns the number of open subscriptions notified.
    pub fn notify(&self, topic: &TopicName, kind: ChangeKind) -> usize {
        self.lock_channels()
            .get(topic)
            .and_then(|tx| tx.send(kind).ok())
            .unwrap_or(0)
    }

    /// Drops the channel of `topic`, closing every open subscription to it.
    pub fn close(&self, topic: &TopicName) {
        self.lock_channels().remove(topic);
    }

    /// Number of open subscriptions to `topic`.
    pub fn subscriber_count(&self, topic: &TopicName) -> usize {
        self.lock_channels()
            .get(topic)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ChangeSource for LocalChangeHub {
    async fn open(&self, topic: &TopicName) -> Result<ChangeReceiver, BoxError> {
        let capacity = self.capacity;
        let rx = self
            .lock_channels()
            .entry(topic.clone())
            .or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe();

        Ok(rx)
    }
}

use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use super::{
    core::{Snapshot, TopicName},
    process::error::{TopicProcessFatalError, TopicProcessRecoverableError},
};

/// Synchronization status of a single topic.
#[derive(Debug, Clone)]
pub enum TopicStatus {
    /// The topic is registered but the layer was not started yet.
    NotInitiated,
    /// A fetch is in flight.
    Fetching,
    /// The last fetch succeeded.
    Synced,
    /// The last fetch failed. The previous snapshot, if any, is still available.
    FetchFailed(Arc<TopicProcessRecoverableError>),
    /// The change-notification channel was lost. The snapshot stays available but will not be
    /// refreshed until the session restarts.
    Degraded(Arc<TopicProcessFatalError>),
    /// The layer was stopped.
    Stopped,
}

impl TopicStatus {
    /// Returns `true` if the topic can no longer receive refreshes.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Degraded(_) | Self::Stopped)
    }
}

impl fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitiated => write!(f, "Not initiated"),
            Self::Fetching => write!(f, "Fetching"),
            Self::Synced => write!(f, "Synced"),
            Self::FetchFailed(error) => write!(f, "Fetch failed: {error}"),
            Self::Degraded(error) => write!(f, "Degraded: {error}"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

impl From<TopicProcessRecoverableError> for TopicStatus {
    fn from(value: TopicProcessRecoverableError) -> Self {
        Self::FetchFailed(Arc::new(value))
    }
}

impl From<TopicProcessFatalError> for TopicStatus {
    fn from(value: TopicProcessFatalError) -> Self {
        Self::Degraded(Arc::new(value))
    }
}

/// Last successfully fetched value of a topic.
#[derive(Debug)]
pub struct TopicSnapshot<T: Snapshot> {
    topic: TopicName,
    data: Arc<T>,
    fetched_at: DateTime<Utc>,
}

impl<T: Snapshot> TopicSnapshot<T> {
    pub fn topic(&self) -> &TopicName {
        &self.topic
    }

    pub fn data(&self) -> &Arc<T> {
        &self.data
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

impl<T: Snapshot> Clone for TopicSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            topic: self.topic.clone(),
            data: self.data.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

/// Update events emitted by the synchronization layer.
#[derive(Debug)]
pub enum SyncUpdate<T: Snapshot> {
    /// A topic's status has changed.
    Status {
        topic: TopicName,
        status: TopicStatus,
    },
    /// A topic's snapshot was replaced by a freshly fetched one.
    Snapshot(TopicSnapshot<T>),
}

impl<T: Snapshot> Clone for SyncUpdate<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Status { topic, status } => Self::Status {
                topic: topic.clone(),
                status: status.clone(),
            },
            Self::Snapshot(snapshot) => Self::Snapshot(snapshot.clone()),
        }
    }
}

pub(crate) type SyncTransmitter<T> = broadcast::Sender<SyncUpdate<T>>;

/// Receiver for subscribing to [`SyncUpdate`]s.
pub type SyncReceiver<T> = broadcast::Receiver<SyncUpdate<T>>;

/// Trait for reading topic status and snapshots, and subscribing to updates.
pub trait SyncReader<T: Snapshot>: Send + Sync + 'static {
    /// Creates a new [`SyncReceiver`] for subscribing to sync updates.
    fn update_receiver(&self) -> SyncReceiver<T>;

    /// Returns the names of all registered topics.
    fn topics(&self) -> Vec<TopicName>;

    /// Returns the current status of `topic`, or `None` if it is not registered.
    fn topic_status(&self, topic: &TopicName) -> Option<TopicStatus>;

    /// Returns the last successfully fetched snapshot of `topic`.
    fn snapshot(&self, topic: &TopicName) -> Option<TopicSnapshot<T>>;
}

#[derive(Debug)]
struct TopicState<T: Snapshot> {
    status: TopicStatus,
    snapshot: Option<TopicSnapshot<T>>,
}

#[derive(Debug)]
pub(crate) struct SyncStatusManager<T: Snapshot> {
    topics: Mutex<BTreeMap<TopicName, TopicState<T>>>,
    update_tx: SyncTransmitter<T>,
}

impl<T: Snapshot> SyncStatusManager<T> {
    pub fn new(update_tx: SyncTransmitter<T>) -> Arc<Self> {
        Arc::new(Self {
            topics: Mutex::new(BTreeMap::new()),
            update_tx,
        })
    }

    fn lock_topics(&self) -> MutexGuard<'_, BTreeMap<TopicName, TopicState<T>>> {
        self.topics
            .lock()
            .expect("`SyncStatusManager` mutex can't be poisoned")
    }

    /// Registers `topic` with status [`TopicStatus::NotInitiated`]. Returns `false` if the topic
    /// was already registered.
    pub fn register(&self, topic: TopicName) -> bool {
        let mut topics = self.lock_topics();
        if topics.contains_key(&topic) {
            return false;
        }

        topics.insert(
            topic,
            TopicState {
                status: TopicStatus::NotInitiated,
                snapshot: None,
            },
        );
        true
    }

    pub fn update_status(&self, topic: &TopicName, new_status: TopicStatus) {
        let mut topics = self.lock_topics();
        let Some(state) = topics.get_mut(topic) else {
            return;
        };
        state.status = new_status.clone();
        drop(topics);

        // Ignore no-receivers errors
        let _ = self.update_tx.send(SyncUpdate::Status {
            topic: topic.clone(),
            status: new_status,
        });
    }

    /// Replaces the snapshot of `topic` wholesale and marks it as synced.
    pub fn commit_snapshot(&self, topic: &TopicName, data: T) {
        let snapshot = TopicSnapshot {
            topic: topic.clone(),
            data: Arc::new(data),
            fetched_at: Utc::now(),
        };

        let mut topics = self.lock_topics();
        let Some(state) = topics.get_mut(topic) else {
            return;
        };
        state.snapshot = Some(snapshot.clone());
        state.status = TopicStatus::Synced;
        drop(topics);

        let _ = self.update_tx.send(SyncUpdate::Snapshot(snapshot));
        let _ = self.update_tx.send(SyncUpdate::Status {
            topic: topic.clone(),
            status: TopicStatus::Synced,
        });
    }

    /// Marks every topic as stopped, keeping their snapshots.
    pub fn mark_all_stopped(&self) {
        let topics: Vec<TopicName> = self.lock_topics().keys().cloned().collect();
        for topic in topics {
            self.update_status(&topic, TopicStatus::Stopped);
        }
    }
}

impl<T: Snapshot> SyncReader<T> for SyncStatusManager<T> {
    fn update_receiver(&self) -> SyncReceiver<T> {
        self.update_tx.subscribe()
    }

    fn topics(&self) -> Vec<TopicName> {
        self.lock_topics().keys().cloned().collect()
    }

    fn topic_status(&self, topic: &TopicName) -> Option<TopicStatus> {
        self.lock_topics().get(topic).map(|state| state.status.clone())
    }

    fn snapshot(&self, topic: &TopicName) -> Option<TopicSnapshot<T>> {
        self.lock_topics()
            .get(topic)
            .and_then(|state| state.snapshot.clone())
    }
}

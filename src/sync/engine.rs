use std::sync::{Arc, Mutex};

use futures::future;
use tokio::{sync::broadcast, time};

use crate::util::AbortOnDropHandle;

use super::{
    config::{SyncConfig, SyncControllerConfig},
    core::{Snapshot, TopicFetcher, TopicName, WrappedTopicFetcher},
    error::{Result, SyncError},
    process::TopicProcess,
    source::ChangeSource,
    state::{SyncReader, SyncReceiver, SyncStatusManager, SyncUpdate},
};

type TopicHandles = Vec<(TopicName, AbortOnDropHandle<()>)>;

/// Controller for a running synchronization layer.
#[derive(Debug)]
pub struct SyncController<T: Snapshot> {
    config: SyncControllerConfig,
    handles: Mutex<Option<TopicHandles>>,
    shutdown_tx: broadcast::Sender<()>,
    status_manager: Arc<SyncStatusManager<T>>,
}

impl<T: Snapshot> SyncController<T> {
    fn new(
        config: &SyncConfig,
        handles: TopicHandles,
        shutdown_tx: broadcast::Sender<()>,
        status_manager: Arc<SyncStatusManager<T>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: config.into(),
            handles: Mutex::new(Some(handles)),
            shutdown_tx,
            status_manager,
        })
    }

    pub fn reader(&self) -> Arc<dyn SyncReader<T>> {
        self.status_manager.clone()
    }

    pub fn update_receiver(&self) -> SyncReceiver<T> {
        self.status_manager.update_receiver()
    }

    fn try_consume_handles(&self) -> Option<TopicHandles> {
        self.handles
            .lock()
            .expect("`SyncController` mutex can't be poisoned")
            .take()
    }

    /// Stops every topic: closes all change-notification channels and drops pending refreshes.
    /// In-flight fetches are left to complete, but their results are discarded. Snapshots remain
    /// readable after shutdown.
    ///
    /// Topic tasks that don't stop within the configured timeout are aborted. This method can
    /// only be called once per controller instance.
    pub async fn shutdown(&self) -> Result<()> {
        let Some(mut handles) = self.try_consume_handles() else {
            return Err(SyncError::SyncAlreadyShutdown);
        };

        let shutdown_res = if handles.is_empty() {
            Ok(())
        } else if let Err(e) = self.shutdown_tx.send(()) {
            handles.iter().for_each(|(_, handle)| handle.abort());
            Err(SyncError::SendShutdownSignalFailed(e))
        } else {
            let join_all = future::join_all(handles.iter_mut().map(|(_, handle)| handle));
            let timeout_res = time::timeout(self.config.shutdown_timeout(), join_all).await;

            match timeout_res {
                Ok(join_results) => handles
                    .iter()
                    .zip(join_results)
                    .find_map(|((topic, _), join_res)| {
                        join_res.err().map(|source| SyncError::TopicTaskJoin {
                            topic: topic.clone(),
                            source,
                        })
                    })
                    .map_or(Ok(()), Err),
                Err(_) => {
                    handles.iter().for_each(|(_, handle)| handle.abort());
                    Err(SyncError::ShutdownTimeout)
                }
            }
        };

        // Receivers still held by aborted tasks are released here
        drop(handles);

        self.status_manager.mark_all_stopped();

        shutdown_res
    }
}

/// Builder for the synchronization layer.
///
/// Topics are registered before [`start`](SyncEngine::start). Each topic is then kept up to date
/// by its own background task, refetching the full snapshot whenever its change-notification
/// channel reports a change.
pub struct SyncEngine<T: Snapshot> {
    config: SyncConfig,
    change_source: Arc<dyn ChangeSource>,
    topics: Vec<(TopicName, WrappedTopicFetcher<T>)>,
    status_manager: Arc<SyncStatusManager<T>>,
}

impl<T: Snapshot> SyncEngine<T> {
    pub fn new(config: impl Into<SyncConfig>, change_source: Arc<dyn ChangeSource>) -> Self {
        let config = config.into();

        let (update_tx, _) = broadcast::channel::<SyncUpdate<T>>(config.update_channel_capacity());

        let status_manager = SyncStatusManager::new(update_tx);

        Self {
            config,
            change_source,
            topics: Vec::new(),
            status_manager,
        }
    }

    /// Registers a topic. Topic names must be unique.
    pub fn register_topic(
        &mut self,
        topic: impl Into<TopicName>,
        fetcher: impl TopicFetcher<T> + 'static,
    ) -> Result<()> {
        let topic = topic.into();

        if !self.status_manager.register(topic.clone()) {
            return Err(SyncError::DuplicateTopic(topic));
        }

        let fetcher = WrappedTopicFetcher::new(Arc::new(fetcher));
        self.topics.push((topic, fetcher));

        Ok(())
    }

    pub fn reader(&self) -> Arc<dyn SyncReader<T>> {
        self.status_manager.clone()
    }

    pub fn update_receiver(&self) -> SyncReceiver<T> {
        self.status_manager.update_receiver()
    }

    /// Opens every topic's change-notification channel and performs the initial load.
    pub fn start(self) -> Arc<SyncController<T>> {
        // Internal channel for shutdown signal
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let handles = self
            .topics
            .into_iter()
            .map(|(topic, fetcher)| {
                tracing::debug!(%topic, "starting topic");

                let handle = TopicProcess::spawn(
                    topic.clone(),
                    fetcher,
                    self.change_source.clone(),
                    &shutdown_tx,
                    self.status_manager.clone(),
                );

                (topic, handle)
            })
            .collect();

        SyncController::new(&self.config, handles, shutdown_tx, self.status_manager)
    }
}

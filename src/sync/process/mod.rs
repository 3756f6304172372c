use std::sync::Arc;

use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};

use crate::util::AbortOnDropHandle;

use super::{
    core::{Snapshot, TopicName, WrappedTopicFetcher},
    source::{ChangeReceiver, ChangeSource},
    state::{SyncStatusManager, TopicStatus},
};

pub(crate) mod error;

use error::{TopicProcessFatalError, TopicProcessRecoverableError, TopicRecoverableResult};

/// Background task keeping a single topic's snapshot up to date.
///
/// Fetches run in their own task so that, on shutdown, an in-flight fetch is left to complete
/// while its result is discarded. At most one refresh is kept pending while a fetch is in flight,
/// no matter how many notifications arrive.
pub(super) struct TopicProcess<T: Snapshot> {
    topic: TopicName,
    fetcher: WrappedTopicFetcher<T>,
    change_source: Arc<dyn ChangeSource>,
    status_manager: Arc<SyncStatusManager<T>>,
}

impl<T: Snapshot> TopicProcess<T> {
    pub fn spawn(
        topic: TopicName,
        fetcher: WrappedTopicFetcher<T>,
        change_source: Arc<dyn ChangeSource>,
        shutdown_tx: &broadcast::Sender<()>,
        status_manager: Arc<SyncStatusManager<T>>,
    ) -> AbortOnDropHandle<()> {
        // Subscribe before spawning so a shutdown sent right after `start` is never missed
        let shutdown_rx = shutdown_tx.subscribe();

        tokio::spawn(async move {
            let process = Self {
                topic,
                fetcher,
                change_source,
                status_manager,
            };

            process.run(shutdown_rx).await
        })
        .into()
    }

    fn spawn_fetch(&self) -> JoinHandle<TopicRecoverableResult<T>> {
        self.status_manager
            .update_status(&self.topic, TopicStatus::Fetching);

        let fetcher = self.fetcher.clone();
        tokio::spawn(async move { fetcher.fetch().await })
    }

    fn handle_fetch_result(
        &self,
        fetch_res: TopicRecoverableResult<T>,
        degraded: Option<&Arc<TopicProcessFatalError>>,
    ) {
        match fetch_res {
            Ok(data) => {
                tracing::debug!(topic = %self.topic, "snapshot refreshed");
                self.status_manager.commit_snapshot(&self.topic, data);
            }
            Err(e) => {
                tracing::warn!(topic = %self.topic, error = %e, "fetch failed, keeping last snapshot");
                self.status_manager.update_status(&self.topic, e.into());
            }
        }

        // A lost channel outlives any later fetch result
        if let Some(fatal) = degraded {
            self.status_manager
                .update_status(&self.topic, TopicStatus::Degraded(fatal.clone()));
        }
    }

    fn degrade(
        &self,
        fatal: TopicProcessFatalError,
        fetch_in_flight: bool,
    ) -> Arc<TopicProcessFatalError> {
        let fatal = Arc::new(fatal);
        tracing::error!(topic = %self.topic, error = %fatal, "topic will not be refreshed");

        // Otherwise applied once the in-flight fetch completes
        if !fetch_in_flight {
            self.status_manager
                .update_status(&self.topic, TopicStatus::Degraded(fatal.clone()));
        }

        fatal
    }

    async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut degraded: Option<Arc<TopicProcessFatalError>> = None;

        // The initial load doesn't wait for the change-notification channel to open
        let mut fetch_handle: Option<JoinHandle<TopicRecoverableResult<T>>> =
            Some(self.spawn_fetch());
        let mut refresh_pending = false;

        let mut open_fut = Some(self.change_source.open(&self.topic));
        let mut change_rx: Option<ChangeReceiver> = None;

        loop {
            if refresh_pending && fetch_handle.is_none() {
                refresh_pending = false;
                fetch_handle = Some(self.spawn_fetch());
            }

            tokio::select! {
                biased;
                // Dropping `fetch_handle` detaches the in-flight fetch, and dropping `change_rx`
                // unsubscribes
                _ = shutdown_rx.recv() => return,
                open_res = async {
                    open_fut.as_mut().expect("`open_fut` is `Some`").await
                }, if open_fut.is_some() => {
                    open_fut = None;

                    match open_res {
                        Ok(rx) => {
                            // Changes committed between a completed initial load and the
                            // subscription would otherwise be missed
                            if fetch_handle.is_none() {
                                refresh_pending = true;
                            }
                            change_rx = Some(rx);
                        }
                        Err(e) => {
                            let fatal = TopicProcessFatalError::SubscriptionOpenFailed(e.to_string());
                            degraded = Some(self.degrade(fatal, fetch_handle.is_some()));
                        }
                    }
                }
                join_res = async {
                    fetch_handle.as_mut().expect("`fetch_handle` is `Some`").await
                }, if fetch_handle.is_some() => {
                    fetch_handle = None;

                    let fetch_res = join_res
                        .map_err(TopicProcessRecoverableError::FetchTaskJoin)
                        .and_then(|res| res);

                    self.handle_fetch_result(fetch_res, degraded.as_ref());
                }
                change_res = async {
                    change_rx.as_mut().expect("`change_rx` is `Some`").recv().await
                }, if change_rx.is_some() => {
                    match change_res {
                        Ok(kind) => {
                            tracing::trace!(topic = %self.topic, %kind, "change notification");
                            refresh_pending = true;
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::trace!(topic = %self.topic, skipped, "change notifications collapsed");
                            refresh_pending = true;
                        }
                        Err(RecvError::Closed) => {
                            change_rx = None;

                            let fatal = TopicProcessFatalError::SubscriptionChannelClosed;
                            degraded = Some(self.degrade(fatal, fetch_handle.is_some()));
                        }
                    }
                }
            }
        }
    }
}

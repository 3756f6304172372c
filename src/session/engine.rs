use std::sync::{Arc, Mutex};

use tokio::{sync::broadcast, time};
use uuid::Uuid;

use crate::{
    alert::{AlertEngine, AlertLevel},
    display::{DisplayMode, DisplayModeTracker},
    reload::{ReloadHandler, ReloadOutcome, ReloadWatchdog, Visibility},
    rotation::{EditingHandle, RotationScheduler, View},
    shared::DashboardSnapshot,
    sync::{ChangeSource, SyncController, SyncEngine, SyncReader, TopicFetcher, TopicName},
    util::AbortOnDropHandle,
};

use super::{
    config::{SessionConfig, SessionControllerConfig},
    error::{Result, SessionError},
    process::{SessionProcess, SessionReceivers},
    state::{SessionReceiver, SessionStatus, SessionStatusManager, SessionUpdate},
};

/// Controller for a running dashboard session.
#[derive(Debug)]
pub struct DashboardController {
    session_id: Uuid,
    config: SessionControllerConfig,
    handle: Mutex<Option<AbortOnDropHandle<()>>>,
    shutdown_tx: broadcast::Sender<()>,
    sync: Arc<SyncController<DashboardSnapshot>>,
    rotation: Arc<RotationScheduler>,
    alert: Arc<AlertEngine>,
    display: Arc<DisplayModeTracker>,
    watchdog: Arc<ReloadWatchdog>,
    status_manager: Arc<SessionStatusManager>,
}

impl DashboardController {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn update_receiver(&self) -> SessionReceiver {
        self.status_manager.update_receiver()
    }

    pub fn status(&self) -> SessionStatus {
        self.status_manager.status()
    }

    /// Reader for the topics' status and last snapshots.
    pub fn sync_reader(&self) -> Arc<dyn SyncReader<DashboardSnapshot>> {
        self.sync.reader()
    }

    pub fn rotation(&self) -> &Arc<RotationScheduler> {
        &self.rotation
    }

    pub fn alert(&self) -> &Arc<AlertEngine> {
        &self.alert
    }

    pub fn display(&self) -> &Arc<DisplayModeTracker> {
        &self.display
    }

    pub fn watchdog(&self) -> &Arc<ReloadWatchdog> {
        &self.watchdog
    }

    pub fn active_view(&self) -> View {
        self.rotation.active_view()
    }

    pub fn select_view(&self, view: View) {
        self.rotation.select_view(view);
    }

    /// Returns a handle for the editing surface. Rotation pauses while it reports an edit.
    pub fn editing_handle(&self) -> EditingHandle {
        self.rotation.editing_handle()
    }

    pub fn alert_level(&self) -> Option<AlertLevel> {
        self.alert.level()
    }

    /// Returns `true` while the celebratory effect is shown on the sales goal view.
    pub fn celebration_visible(&self) -> bool {
        self.status_manager.celebration_visible()
    }

    pub fn set_visibility(&self, visibility: Visibility) {
        self.watchdog.set_visibility(visibility);
    }

    pub fn on_resize(&self, width: u32, height: u32) -> DisplayMode {
        self.display.on_resize(width, height)
    }

    /// Requests an immediate full restart, subject to the same cooldown as scheduled reloads.
    pub fn request_reload(&self) -> ReloadOutcome {
        self.watchdog.trigger_reload()
    }

    fn try_consume_handle(&self) -> Option<AbortOnDropHandle<()>> {
        self.handle
            .lock()
            .expect("`DashboardController` mutex can't be poisoned")
            .take()
    }

    async fn stop_router(&self, mut handle: AbortOnDropHandle<()>) -> Result<()> {
        if let Err(e) = self.shutdown_tx.send(()) {
            handle.abort();
            return Err(SessionError::SendShutdownSignalFailed(e));
        }

        tokio::select! {
            join_res = &mut handle => join_res.map_err(SessionError::ProcessTaskJoin),
            _ = time::sleep(self.config.shutdown_timeout()) => {
                handle.abort();
                Err(SessionError::ShutdownTimeout)
            }
        }
    }

    /// Tears the session down: unsubscribes every change-notification channel, cancels the
    /// rotation and reload timers and cancels the pending celebratory actions. Every step runs
    /// even if a previous one failed. The first failure is returned.
    ///
    /// This method can only be called once per controller instance.
    pub async fn shutdown(&self) -> Result<()> {
        let Some(handle) = self.try_consume_handle() else {
            return Err(SessionError::SessionAlreadyShutdown);
        };

        tracing::info!(session_id = %self.session_id, "shutting down session");

        self.status_manager
            .update_status(SessionStatus::ShutdownInitiated);

        let sync_res = self
            .sync
            .shutdown()
            .await
            .map_err(SessionError::SyncShutdownFailed);

        self.rotation.stop();
        self.watchdog.stop();
        self.alert.cancel_pending();

        let router_res = self.stop_router(handle).await;

        self.status_manager.set_celebration_visible(false);
        self.status_manager.update_status(SessionStatus::Shutdown);

        if let Err(e) = &sync_res {
            tracing::error!(session_id = %self.session_id, error = %e, "sync shutdown failed");
        }

        sync_res.and(router_res)
    }
}

/// Builder for a dashboard session.
///
/// Topics are registered first. [`start`](DashboardEngine::start) then wires every component
/// together: the synchronization layer performs its initial load, the rotation scheduler and the
/// reload watchdog start their timers, and goal snapshots are fed to the alert engine.
pub struct DashboardEngine {
    config: SessionConfig,
    sync_engine: SyncEngine<DashboardSnapshot>,
    goal_topic: Option<TopicName>,
}

impl DashboardEngine {
    pub fn new(config: impl Into<SessionConfig>, change_source: Arc<dyn ChangeSource>) -> Self {
        let config = config.into();
        let sync_engine = SyncEngine::new(config.sync().clone(), change_source);

        Self {
            config,
            sync_engine,
            goal_topic: None,
        }
    }

    /// Registers a topic. Topic names must be unique.
    pub fn register_topic(
        &mut self,
        topic: impl Into<TopicName>,
        fetcher: impl TopicFetcher<DashboardSnapshot> + 'static,
    ) -> Result<()> {
        self.sync_engine
            .register_topic(topic, fetcher)
            .map_err(SessionError::TopicRegistration)
    }

    /// Registers the topic whose snapshots drive the alert engine. At most one goal topic can be
    /// registered.
    pub fn register_goal_topic(
        &mut self,
        topic: impl Into<TopicName>,
        fetcher: impl TopicFetcher<DashboardSnapshot> + 'static,
    ) -> Result<()> {
        if let Some(goal_topic) = &self.goal_topic {
            return Err(SessionError::GoalTopicAlreadyRegistered(goal_topic.clone()));
        }

        let topic = topic.into();
        self.register_topic(topic.clone(), fetcher)?;
        self.goal_topic = Some(topic);

        Ok(())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Starts the session. `reload_handler` is invoked when the watchdog issues a reload and must
    /// restart the whole session (see [`DashboardSupervisor`](super::DashboardSupervisor)).
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self, reload_handler: Arc<dyn ReloadHandler>) -> Arc<DashboardController> {
        let session_id = Uuid::new_v4();
        let config = self.config;

        tracing::info!(%session_id, "starting session");

        let (update_tx, _) = broadcast::channel::<SessionUpdate>(config.update_channel_capacity());
        let status_manager = Arc::new(SessionStatusManager::new(update_tx));

        let rotation = RotationScheduler::new(config.rotation().clone());
        let alert = Arc::new(AlertEngine::new(config.alert().clone()));
        let display = Arc::new(DisplayModeTracker::new(config.device_hints().clone()));
        let watchdog = Arc::new(ReloadWatchdog::new(config.reload().clone(), reload_handler));

        // Subscribe before starting anything so no initial event is missed
        let receivers = SessionReceivers {
            sync: self.sync_engine.update_receiver(),
            rotation: rotation.update_receiver(),
            alert: alert.update_receiver(),
            display: display.update_receiver(),
            reload: watchdog.update_receiver(),
        };

        let sync = self.sync_engine.start();

        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let handle = SessionProcess::spawn(
            session_id,
            self.goal_topic,
            sync.reader(),
            rotation.clone(),
            alert.clone(),
            status_manager.clone(),
            receivers,
            &shutdown_tx,
        );

        rotation.start();
        watchdog.start();

        status_manager.update_status(SessionStatus::Running);

        Arc::new(DashboardController {
            session_id,
            config: (&config).into(),
            handle: Mutex::new(Some(handle)),
            shutdown_tx,
            sync,
            rotation,
            alert,
            display,
            watchdog,
            status_manager,
        })
    }
}

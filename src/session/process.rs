use std::sync::Arc;

use chrono::Local;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::{
    alert::{AlertEngine, AlertReceiver, AlertUpdate},
    display::DisplayModeReceiver,
    reload::ReloadReceiver,
    rotation::{RotationReceiver, RotationScheduler, RotationUpdate, View},
    shared::DashboardSnapshot,
    sync::{SyncReader, SyncReceiver, SyncUpdate, TopicName},
    util::AbortOnDropHandle,
};

use super::state::{SessionStatusManager, SessionUpdate};

pub(super) struct SessionReceivers {
    pub sync: SyncReceiver<DashboardSnapshot>,
    pub rotation: RotationReceiver,
    pub alert: AlertReceiver,
    pub display: DisplayModeReceiver,
    pub reload: ReloadReceiver,
}

/// Routes component events to the session's subscribers and wires the components together:
/// goal snapshots feed the alert engine, and the celebratory effect is gated on the active view.
pub(super) struct SessionProcess {
    session_id: Uuid,
    goal_topic: Option<TopicName>,
    sync_reader: Arc<dyn SyncReader<DashboardSnapshot>>,
    rotation: Arc<RotationScheduler>,
    alert: Arc<AlertEngine>,
    status_manager: Arc<SessionStatusManager>,
}

impl SessionProcess {
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        session_id: Uuid,
        goal_topic: Option<TopicName>,
        sync_reader: Arc<dyn SyncReader<DashboardSnapshot>>,
        rotation: Arc<RotationScheduler>,
        alert: Arc<AlertEngine>,
        status_manager: Arc<SessionStatusManager>,
        receivers: SessionReceivers,
        shutdown_tx: &broadcast::Sender<()>,
    ) -> AbortOnDropHandle<()> {
        let shutdown_rx = shutdown_tx.subscribe();

        tokio::spawn(async move {
            let process = Self {
                session_id,
                goal_topic,
                sync_reader,
                rotation,
                alert,
                status_manager,
            };

            process.run(receivers, shutdown_rx).await
        })
        .into()
    }

    fn observe_goal(&self, snapshot: &DashboardSnapshot) {
        let today = Local::now().date_naive();
        self.alert.observe(snapshot.goal_metric(), today);
    }

    /// Reclassifies the cached goal snapshot as of today.
    fn resync_goal(&self) {
        let Some(goal_topic) = self.goal_topic.as_ref() else {
            return;
        };

        if let Some(snapshot) = self.sync_reader.snapshot(goal_topic) {
            self.observe_goal(snapshot.data());
        }
    }

    fn refresh_celebration(&self) {
        let visible =
            self.alert.celebration_visible() && self.rotation.active_view() == View::SalesGoal;
        self.status_manager.set_celebration_visible(visible);
    }

    fn handle_sync_update(&self, update: SyncUpdate<DashboardSnapshot>) {
        if let SyncUpdate::Snapshot(snapshot) = &update
            && self.goal_topic.as_ref() == Some(snapshot.topic())
        {
            self.observe_goal(snapshot.data());
        }

        self.status_manager.send(SessionUpdate::Sync(update));
    }

    fn handle_rotation_update(&self, update: RotationUpdate) {
        let session_update = match update {
            RotationUpdate::ViewChanged { previous, current } => {
                // Days remaining shift over time, so the cached goal is reclassified on entry
                if current == View::SalesGoal {
                    self.resync_goal();
                }
                self.refresh_celebration();
                SessionUpdate::ViewChanged { previous, current }
            }
            RotationUpdate::Paused => SessionUpdate::RotationPaused(true),
            RotationUpdate::Resumed => SessionUpdate::RotationPaused(false),
        };

        self.status_manager.send(session_update);
    }

    fn handle_alert_update(&self, update: AlertUpdate) {
        match update {
            AlertUpdate::LevelChanged { current, .. } => {
                self.status_manager.send(SessionUpdate::AlertLevel(current));
            }
            AlertUpdate::AudioCue(cue) => {
                self.status_manager.send(SessionUpdate::AudioCue(cue));
            }
            AlertUpdate::Celebration(_) => self.refresh_celebration(),
        }
    }

    fn lagged(&self, source: &'static str, skipped: u64) {
        tracing::warn!(session_id = %self.session_id, source, skipped, "session router lagged");
    }

    async fn run(self, mut receivers: SessionReceivers, mut shutdown_rx: broadcast::Receiver<()>) {
        tracing::info!(session_id = %self.session_id, "session router started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                sync_res = receivers.sync.recv() => match sync_res {
                    Ok(update) => self.handle_sync_update(update),
                    Err(RecvError::Lagged(skipped)) => {
                        self.lagged("sync", skipped);
                        self.resync_goal();
                    }
                    Err(RecvError::Closed) => break,
                },
                rotation_res = receivers.rotation.recv() => match rotation_res {
                    Ok(update) => self.handle_rotation_update(update),
                    Err(RecvError::Lagged(skipped)) => {
                        self.lagged("rotation", skipped);
                        self.refresh_celebration();
                    }
                    Err(RecvError::Closed) => break,
                },
                alert_res = receivers.alert.recv() => match alert_res {
                    Ok(update) => self.handle_alert_update(update),
                    Err(RecvError::Lagged(skipped)) => {
                        self.lagged("alert", skipped);
                        self.refresh_celebration();
                    }
                    Err(RecvError::Closed) => break,
                },
                display_res = receivers.display.recv() => match display_res {
                    Ok(mode) => self.status_manager.send(SessionUpdate::DisplayMode(mode)),
                    Err(RecvError::Lagged(skipped)) => self.lagged("display", skipped),
                    Err(RecvError::Closed) => break,
                },
                reload_res = receivers.reload.recv() => match reload_res {
                    Ok(update) => self.status_manager.send(SessionUpdate::Reload(update)),
                    Err(RecvError::Lagged(skipped)) => self.lagged("reload", skipped),
                    Err(RecvError::Closed) => break,
                },
            }
        }

        tracing::info!(session_id = %self.session_id, "session router stopped");
    }
}

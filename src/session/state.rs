use std::{
    fmt,
    sync::{Mutex, MutexGuard},
};

use tokio::sync::broadcast;

use crate::{
    alert::{AlertLevel, AudioCue},
    display::DisplayMode,
    reload::ReloadUpdate,
    rotation::View,
    shared::DashboardSnapshot,
    sync::SyncUpdate,
};

/// Lifecycle status of a dashboard session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    ShutdownInitiated,
    Shutdown,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::ShutdownInitiated => write!(f, "Shutdown initiated"),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Events published to the presentation layer.
#[derive(Debug, Clone)]
pub enum SessionUpdate {
    Status(SessionStatus),
    /// A topic's status or snapshot changed. Snapshots can also be read through
    /// [`DashboardController::sync_reader`](super::DashboardController::sync_reader).
    Sync(SyncUpdate<DashboardSnapshot>),
    ViewChanged {
        previous: View,
        current: View,
    },
    /// Rotation was paused (`true`) or resumed (`false`) by the editing surface.
    RotationPaused(bool),
    AlertLevel(AlertLevel),
    AudioCue(AudioCue),
    /// The celebratory effect must be shown (`true`) or cleared (`false`).
    CelebrationVisible(bool),
    DisplayMode(DisplayMode),
    Reload(ReloadUpdate),
}

impl From<SessionStatus> for SessionUpdate {
    fn from(value: SessionStatus) -> Self {
        Self::Status(value)
    }
}

pub(super) type SessionTransmitter = broadcast::Sender<SessionUpdate>;

/// Receiver for subscribing to [`SessionUpdate`]s.
pub type SessionReceiver = broadcast::Receiver<SessionUpdate>;

#[derive(Debug)]
struct SessionState {
    status: SessionStatus,
    celebration_visible: bool,
}

#[derive(Debug)]
pub(super) struct SessionStatusManager {
    state: Mutex<SessionState>,
    update_tx: SessionTransmitter,
}

impl SessionStatusManager {
    pub fn new(update_tx: SessionTransmitter) -> Self {
        Self {
            state: Mutex::new(SessionState {
                status: SessionStatus::Running,
                celebration_visible: false,
            }),
            update_tx,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .expect("`SessionStatusManager` mutex can't be poisoned")
    }

    pub fn send(&self, update: SessionUpdate) {
        // Ignore no-receivers errors
        let _ = self.update_tx.send(update);
    }

    pub fn update_receiver(&self) -> SessionReceiver {
        self.update_tx.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        self.lock_state().status
    }

    pub fn update_status(&self, new_status: SessionStatus) {
        self.lock_state().status = new_status;
        self.send(new_status.into());
    }

    pub fn celebration_visible(&self) -> bool {
        self.lock_state().celebration_visible
    }

    /// Emits [`SessionUpdate::CelebrationVisible`] only when the visibility changes.
    pub fn set_celebration_visible(&self, visible: bool) {
        let mut state = self.lock_state();
        if state.celebration_visible == visible {
            return;
        }
        state.celebration_visible = visible;
        drop(state);

        self.send(SessionUpdate::CelebrationVisible(visible));
    }
}

use std::sync::{Mutex, MutexGuard};

use tokio::sync::broadcast;

use super::core::{AlertLevel, AudioCue};

/// Update events emitted by the [`AlertEngine`](super::AlertEngine).
#[derive(Debug, Clone, PartialEq)]
pub enum AlertUpdate {
    /// The classification of the observed goal changed.
    LevelChanged {
        previous: Option<AlertLevel>,
        current: AlertLevel,
    },
    /// An audio cue must be played.
    AudioCue(AudioCue),
    /// The celebratory effect must be shown (`true`) or cleared (`false`).
    Celebration(bool),
}

pub(crate) type AlertTransmitter = broadcast::Sender<AlertUpdate>;

/// Receiver for subscribing to [`AlertUpdate`]s.
pub type AlertReceiver = broadcast::Receiver<AlertUpdate>;

#[derive(Debug, Default)]
struct CelebrationInner {
    visible: bool,
    generation: u64,
}

/// Visibility of the celebratory effect, shared with the delayed show/clear task.
///
/// Every celebration window gets a generation. Updates tagged with a superseded generation are
/// dropped, so a task that was aborted while racing its own cancellation can't resurrect the
/// effect.
#[derive(Debug)]
pub(super) struct CelebrationState {
    inner: Mutex<CelebrationInner>,
    update_tx: AlertTransmitter,
}

impl CelebrationState {
    pub fn new(update_tx: AlertTransmitter) -> Self {
        Self {
            inner: Mutex::new(CelebrationInner::default()),
            update_tx,
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, CelebrationInner> {
        self.inner
            .lock()
            .expect("`CelebrationState` mutex can't be poisoned")
    }

    pub fn is_visible(&self) -> bool {
        self.lock_inner().visible
    }

    /// Starts a new celebration window, invalidating updates from previous ones.
    pub fn begin(&self) -> u64 {
        let mut inner = self.lock_inner();
        inner.generation += 1;
        inner.generation
    }

    /// Invalidates the current window and clears the effect if shown.
    pub fn cancel(&self) {
        let mut inner = self.lock_inner();
        inner.generation += 1;
        self.apply(inner, false);
    }

    /// Sets the visibility on behalf of window `generation`. Ignored if the window was superseded.
    pub fn set_visible(&self, generation: u64, visible: bool) {
        let inner = self.lock_inner();
        if inner.generation != generation {
            return;
        }
        self.apply(inner, visible);
    }

    fn apply(&self, mut inner: MutexGuard<'_, CelebrationInner>, visible: bool) {
        if inner.visible == visible {
            return;
        }
        inner.visible = visible;

        // Sent under the lock so that updates reach subscribers in state order.
        // Ignore no-receivers errors
        let _ = self.update_tx.send(AlertUpdate::Celebration(visible));
    }
}

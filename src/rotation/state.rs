use std::sync::Mutex;

use tokio::sync::broadcast;

use super::core::View;

/// Update events emitted by the [`RotationScheduler`](super::RotationScheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationUpdate {
    /// The active view changed, either on a timer tick or by manual selection.
    ViewChanged { previous: View, current: View },
    Paused,
    Resumed,
}

pub(super) type RotationTransmitter = broadcast::Sender<RotationUpdate>;

/// Receiver for subscribing to [`RotationUpdate`]s.
pub type RotationReceiver = broadcast::Receiver<RotationUpdate>;

/// Active view pointer, shared between the scheduler and its timer task.
#[derive(Debug)]
pub(super) struct RotationStateManager {
    active_view: Mutex<View>,
    update_tx: RotationTransmitter,
}

impl RotationStateManager {
    pub fn new(initial_view: View, update_tx: RotationTransmitter) -> Self {
        Self {
            active_view: Mutex::new(initial_view),
            update_tx,
        }
    }

    pub fn active_view(&self) -> View {
        *self
            .active_view
            .lock()
            .expect("`RotationStateManager` mutex can't be poisoned")
    }

    pub fn update_receiver(&self) -> RotationReceiver {
        self.update_tx.subscribe()
    }

    pub fn send(&self, update: RotationUpdate) {
        // Ignore no-receivers errors
        let _ = self.update_tx.send(update);
    }

    /// Replaces the active view with `f(active_view)`, emitting an update if it changed.
    pub fn switch(&self, f: impl FnOnce(View) -> View) -> View {
        let mut active_view = self
            .active_view
            .lock()
            .expect("`RotationStateManager` mutex can't be poisoned");

        let previous = *active_view;
        let current = f(previous);
        *active_view = current;
        drop(active_view);

        if previous != current {
            tracing::debug!(%previous, %current, "view changed");
            self.send(RotationUpdate::ViewChanged { previous, current });
        }

        current
    }
}

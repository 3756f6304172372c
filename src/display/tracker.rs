use std::sync::Mutex;

use tokio::sync::broadcast;

use super::core::{DeviceHints, DisplayMode, classify};

/// Receiver for subscribing to display mode changes.
pub type DisplayModeReceiver = broadcast::Receiver<DisplayMode>;

/// Reclassifies the display on every resize and publishes the mode when it flips.
///
/// There is no hysteresis: a viewport oscillating around a threshold flips on every resize.
#[derive(Debug)]
pub struct DisplayModeTracker {
    hints: DeviceHints,
    mode: Mutex<Option<DisplayMode>>,
    update_tx: broadcast::Sender<DisplayMode>,
}

impl DisplayModeTracker {
    pub fn new(hints: DeviceHints) -> Self {
        let (update_tx, _) = broadcast::channel::<DisplayMode>(16);

        Self {
            hints,
            mode: Mutex::new(None),
            update_tx,
        }
    }

    pub fn hints(&self) -> &DeviceHints {
        &self.hints
    }

    /// Returns the last computed mode, or `None` before the first resize.
    pub fn current(&self) -> Option<DisplayMode> {
        *self
            .mode
            .lock()
            .expect("`DisplayModeTracker` mutex can't be poisoned")
    }

    pub fn update_receiver(&self) -> DisplayModeReceiver {
        self.update_tx.subscribe()
    }

    /// Classifies the new viewport. The first classification always counts as a change.
    pub fn on_resize(&self, width: u32, height: u32) -> DisplayMode {
        let new_mode = classify(width, height, &self.hints);

        let mut mode = self
            .mode
            .lock()
            .expect("`DisplayModeTracker` mutex can't be poisoned");
        let previous = mode.replace(new_mode);
        drop(mode);

        if previous != Some(new_mode) {
            tracing::debug!(width, height, mode = %new_mode, "display mode changed");

            // Ignore no-receivers errors
            let _ = self.update_tx.send(new_mode);
        }

        new_mode
    }
}

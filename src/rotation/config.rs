use tokio::time;

use super::core::View;

/// Configuration for the [`RotationScheduler`](super::RotationScheduler).
#[derive(Clone, Debug)]
pub struct RotationConfig {
    interval: time::Duration,
    initial_view: View,
    update_channel_capacity: usize,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            interval: time::Duration::from_secs(30),
            initial_view: View::default(),
            update_channel_capacity: 100,
        }
    }
}

impl RotationConfig {
    /// Returns the time between two automatic view advances.
    pub fn interval(&self) -> time::Duration {
        self.interval
    }

    pub fn initial_view(&self) -> View {
        self.initial_view
    }

    pub fn update_channel_capacity(&self) -> usize {
        self.update_channel_capacity
    }

    /// Sets the time between two automatic view advances. Zero is raised to one second.
    ///
    /// Default: `30` seconds
    pub fn with_interval(mut self, secs: u64) -> Self {
        self.interval = time::Duration::from_secs(secs.max(1));
        self
    }

    /// Default: [`View::AwaitingSignature`]
    pub fn with_initial_view(mut self, view: View) -> Self {
        self.initial_view = view;
        self
    }

    /// Default: `100`
    pub fn with_update_channel_capacity(mut self, capacity: usize) -> Self {
        self.update_channel_capacity = capacity.max(1);
        self
    }
}

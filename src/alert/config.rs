use tokio::time;

use super::core::AlertThresholds;

/// Configuration for the [`AlertEngine`](super::AlertEngine).
#[derive(Clone, Debug)]
pub struct AlertConfig {
    thresholds: AlertThresholds,
    celebration_delay: time::Duration,
    celebration_duration: time::Duration,
    update_channel_capacity: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            thresholds: AlertThresholds::default(),
            celebration_delay: time::Duration::from_secs(2),
            celebration_duration: time::Duration::from_secs(10),
            update_channel_capacity: 100,
        }
    }
}

impl AlertConfig {
    pub fn thresholds(&self) -> AlertThresholds {
        self.thresholds
    }

    /// Returns the delay between reaching the goal and showing the celebratory effect.
    pub fn celebration_delay(&self) -> time::Duration {
        self.celebration_delay
    }

    /// Returns the time, counted from reaching the goal, after which the celebratory effect is
    /// cleared.
    pub fn celebration_duration(&self) -> time::Duration {
        self.celebration_duration
    }

    pub fn update_channel_capacity(&self) -> usize {
        self.update_channel_capacity
    }

    pub fn with_thresholds(mut self, thresholds: AlertThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Sets the celebratory effect delay, in milliseconds.
    ///
    /// Default: `2000`
    pub fn with_celebration_delay(mut self, millis: u64) -> Self {
        self.celebration_delay = time::Duration::from_millis(millis);
        self
    }

    /// Sets the total celebratory effect duration, in milliseconds. Values shorter than the delay
    /// are raised to the delay.
    ///
    /// Default: `10000`
    pub fn with_celebration_duration(mut self, millis: u64) -> Self {
        self.celebration_duration = time::Duration::from_millis(millis);
        self
    }

    /// Default: `100`
    pub fn with_update_channel_capacity(mut self, capacity: usize) -> Self {
        self.update_channel_capacity = capacity.max(1);
        self
    }
}

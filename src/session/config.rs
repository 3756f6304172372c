use tokio::time;

use crate::{
    alert::AlertConfig, display::DeviceHints, reload::ReloadConfig, rotation::RotationConfig,
    sync::SyncConfig,
};

/// Configuration for a dashboard session, bundling the configuration of every component.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    sync: SyncConfig,
    rotation: RotationConfig,
    reload: ReloadConfig,
    alert: AlertConfig,
    device_hints: DeviceHints,
    update_channel_capacity: usize,
    shutdown_timeout: time::Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            rotation: RotationConfig::default(),
            reload: ReloadConfig::default(),
            alert: AlertConfig::default(),
            device_hints: DeviceHints::default(),
            update_channel_capacity: 1_000,
            shutdown_timeout: time::Duration::from_secs(6),
        }
    }
}

impl SessionConfig {
    pub fn sync(&self) -> &SyncConfig {
        &self.sync
    }

    pub fn rotation(&self) -> &RotationConfig {
        &self.rotation
    }

    pub fn reload(&self) -> &ReloadConfig {
        &self.reload
    }

    pub fn alert(&self) -> &AlertConfig {
        &self.alert
    }

    pub fn device_hints(&self) -> &DeviceHints {
        &self.device_hints
    }

    /// Returns the capacity of the [`SessionUpdate`](super::SessionUpdate) broadcast channel.
    pub fn update_channel_capacity(&self) -> usize {
        self.update_channel_capacity
    }

    /// Returns the timeout for stopping the session's event router.
    pub fn shutdown_timeout(&self) -> time::Duration {
        self.shutdown_timeout
    }

    pub fn with_sync(mut self, sync: SyncConfig) -> Self {
        self.sync = sync;
        self
    }

    pub fn with_rotation(mut self, rotation: RotationConfig) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_reload(mut self, reload: ReloadConfig) -> Self {
        self.reload = reload;
        self
    }

    pub fn with_alert(mut self, alert: AlertConfig) -> Self {
        self.alert = alert;
        self
    }

    pub fn with_device_hints(mut self, device_hints: DeviceHints) -> Self {
        self.device_hints = device_hints;
        self
    }

    /// Default: `1000`
    pub fn with_update_channel_capacity(mut self, capacity: usize) -> Self {
        self.update_channel_capacity = capacity.max(1);
        self
    }

    /// Default: `6` seconds
    pub fn with_shutdown_timeout(mut self, secs: u64) -> Self {
        self.shutdown_timeout = time::Duration::from_secs(secs);
        self
    }
}

impl From<ReloadConfig> for SessionConfig {
    fn from(value: ReloadConfig) -> Self {
        Self::default().with_reload(value)
    }
}

#[derive(Debug)]
pub(super) struct SessionControllerConfig {
    shutdown_timeout: time::Duration,
}

impl SessionControllerConfig {
    pub fn shutdown_timeout(&self) -> time::Duration {
        self.shutdown_timeout
    }
}

impl From<&SessionConfig> for SessionControllerConfig {
    fn from(value: &SessionConfig) -> Self {
        Self {
            shutdown_timeout: value.shutdown_timeout(),
        }
    }
}

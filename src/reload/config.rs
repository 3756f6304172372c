use std::{collections::HashMap, fmt};

use tokio::time;

use super::error::{ReloadConfigError, ReloadIntervalValidationError};

pub const ENV_AUTO_RELOAD_ENABLED: &str = "DASHBOARD_AUTO_RELOAD_ENABLED";
pub const ENV_AUTO_RELOAD_MS: &str = "DASHBOARD_AUTO_RELOAD_MS";
pub const ENV_AUTO_RELOAD_PAUSE_WHEN_HIDDEN: &str = "DASHBOARD_AUTO_RELOAD_PAUSE_WHEN_HIDDEN";

/// Validated period between two scheduled reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadInterval(time::Duration);

impl ReloadInterval {
    /// Shortest accepted interval.
    pub const MIN: Self = Self(time::Duration::from_secs(10));

    /// Longest accepted interval, the largest delay a 32-bit millisecond timer can hold.
    pub const MAX: Self = Self(time::Duration::from_millis(i32::MAX as u64));

    /// Interval used when none, or an invalid one, is configured.
    pub const DEFAULT: Self = Self(time::Duration::from_secs(600));

    /// Validates an interval given in milliseconds.
    pub fn from_millis(millis: f64) -> Result<Self, ReloadIntervalValidationError> {
        if !millis.is_finite() {
            return Err(ReloadIntervalValidationError::NotFinite(millis));
        }

        let min_ms = Self::MIN.0.as_millis() as u64;
        if millis < min_ms as f64 {
            return Err(ReloadIntervalValidationError::BelowMinimum {
                value_ms: millis,
                min_ms,
            });
        }

        let max_ms = Self::MAX.0.as_millis() as u64;
        if millis > max_ms as f64 {
            return Err(ReloadIntervalValidationError::AboveMaximum {
                value_ms: millis,
                max_ms,
            });
        }

        Ok(Self(time::Duration::from_secs_f64(millis / 1_000.)))
    }

    /// Like [`from_millis`](Self::from_millis), substituting [`DEFAULT`](Self::DEFAULT) for
    /// invalid values.
    pub fn from_millis_or_default(millis: f64) -> Self {
        Self::from_millis(millis).unwrap_or_else(|e| {
            tracing::warn!(error = %e, default = %Self::DEFAULT, "invalid reload interval");
            Self::DEFAULT
        })
    }

    pub fn as_duration(&self) -> time::Duration {
        self.0
    }
}

impl Default for ReloadInterval {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<time::Duration> for ReloadInterval {
    type Error = ReloadIntervalValidationError;

    fn try_from(value: time::Duration) -> Result<Self, Self::Error> {
        Self::from_millis(value.as_secs_f64() * 1_000.)
    }
}

impl fmt::Display for ReloadInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ms", self.0.as_millis())
    }
}

/// Configuration for the [`ReloadWatchdog`](super::ReloadWatchdog).
#[derive(Clone, Debug, PartialEq)]
pub struct ReloadConfig {
    interval: ReloadInterval,
    enabled: bool,
    pause_when_hidden: bool,
    cooldown: time::Duration,
    update_channel_capacity: usize,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            interval: ReloadInterval::DEFAULT,
            // Scheduled reloads are only wanted outside local development
            enabled: !cfg!(debug_assertions),
            pause_when_hidden: true,
            cooldown: time::Duration::from_secs(5),
            update_channel_capacity: 100,
        }
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ReloadConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ReloadConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}

fn parse_interval(var: &'static str, value: &str) -> Result<ReloadInterval, ReloadConfigError> {
    let millis = value
        .trim()
        .parse::<f64>()
        .map_err(|_| ReloadConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        })?;

    ReloadInterval::from_millis(millis)
        .map_err(|source| ReloadConfigError::InvalidInterval { var, source })
}

impl ReloadConfig {
    /// Reads the configuration from the process environment. See [`from_vars`](Self::from_vars).
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Reads the configuration from `vars`:
    ///
    /// - `DASHBOARD_AUTO_RELOAD_ENABLED`: `true`/`false`/`1`/`0`. Defaults to enabled in release
    ///   builds only.
    /// - `DASHBOARD_AUTO_RELOAD_MS`: reload interval in milliseconds, at least `10000`. Defaults
    ///   to `600000`.
    /// - `DASHBOARD_AUTO_RELOAD_PAUSE_WHEN_HIDDEN`: `true`/`false`/`1`/`0`. Defaults to `true`.
    ///
    /// Missing variables keep their defaults. Invalid values are logged and replaced by their
    /// defaults.
    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect();

        let mut config = Self::default();

        let apply = |res: Result<(), ReloadConfigError>| {
            if let Err(e) = res {
                tracing::warn!(error = %e, "invalid reload configuration, using default");
            }
        };

        if let Some(value) = vars.get(ENV_AUTO_RELOAD_ENABLED) {
            apply(parse_bool(ENV_AUTO_RELOAD_ENABLED, value).map(|v| config.enabled = v));
        }

        if let Some(value) = vars.get(ENV_AUTO_RELOAD_MS) {
            apply(parse_interval(ENV_AUTO_RELOAD_MS, value).map(|v| config.interval = v));
        }

        if let Some(value) = vars.get(ENV_AUTO_RELOAD_PAUSE_WHEN_HIDDEN) {
            apply(
                parse_bool(ENV_AUTO_RELOAD_PAUSE_WHEN_HIDDEN, value)
                    .map(|v| config.pause_when_hidden = v),
            );
        }

        config
    }

    pub fn interval(&self) -> ReloadInterval {
        self.interval
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn pause_when_hidden(&self) -> bool {
        self.pause_when_hidden
    }

    /// Returns the minimum spacing between two issued reloads.
    pub fn cooldown(&self) -> time::Duration {
        self.cooldown
    }

    pub fn update_channel_capacity(&self) -> usize {
        self.update_channel_capacity
    }

    /// Default: [`ReloadInterval::DEFAULT`]
    pub fn with_interval(mut self, interval: ReloadInterval) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the interval in milliseconds, substituting the default for invalid values.
    pub fn with_interval_millis(mut self, millis: f64) -> Self {
        self.interval = ReloadInterval::from_millis_or_default(millis);
        self
    }

    /// Default: `true` in release builds, `false` in debug builds
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Default: `true`
    pub fn with_pause_when_hidden(mut self, pause_when_hidden: bool) -> Self {
        self.pause_when_hidden = pause_when_hidden;
        self
    }

    /// Default: `5` seconds
    pub fn with_cooldown(mut self, secs: u64) -> Self {
        self.cooldown = time::Duration::from_secs(secs);
        self
    }

    /// Default: `100`
    pub fn with_update_channel_capacity(mut self, capacity: usize) -> Self {
        self.update_channel_capacity = capacity.max(1);
        self
    }
}

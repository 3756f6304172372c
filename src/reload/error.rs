use thiserror::Error;

/// Rejected reload interval. The watchdog substitutes its default interval instead.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ReloadIntervalValidationError {
    #[error("Reload interval must be finite, got {0}")]
    NotFinite(f64),

    #[error("Reload interval must be at least {min_ms} ms, got {value_ms} ms")]
    BelowMinimum { value_ms: f64, min_ms: u64 },

    #[error("Reload interval must be at most {max_ms} ms, got {value_ms} ms")]
    AboveMaximum { value_ms: f64, max_ms: u64 },
}

/// Rejected reload environment configuration. The affected setting falls back to its default.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ReloadConfigError {
    #[error("`{var}` must be a boolean (true/false/1/0), got `{value}`")]
    InvalidBool { var: &'static str, value: String },

    #[error("`{var}` must be a number of milliseconds, got `{value}`")]
    InvalidNumber { var: &'static str, value: String },

    #[error("`{var}`: {source}")]
    InvalidInterval {
        var: &'static str,
        #[source]
        source: ReloadIntervalValidationError,
    },
}

use std::fmt;

use chrono::NaiveDate;
use crate::shared::GoalMetric;

/// Health of a goal metric, derived from its percentage and the days left in its period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertLevel {
    Normal,
    Warning,
    Critical,
    Achieved,
}

impl AlertLevel {
    pub fn is_achieved(&self) -> bool {
        matches!(self, Self::Achieved)
    }

    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical)
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Warning => write!(f, "Warning"),
            Self::Critical => write!(f, "Critical"),
            Self::Achieved => write!(f, "Achieved"),
        }
    }
}

/// Audio cue requested on a level transition. Playback is left to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    /// Played when the goal is reached.
    Success,
    /// Played when the goal becomes critical.
    Warning,
}

impl fmt::Display for AudioCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// Business thresholds used to classify goal progress.
///
/// The same thresholds drive both the [`AlertEngine`](super::AlertEngine) and
/// [`TeamGoalSummary`](super::TeamGoalSummary) buckets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
    achieved_pct: f64,
    warning_pct: f64,
    critical_days: i64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            achieved_pct: 100.,
            warning_pct: 80.,
            critical_days: 3,
        }
    }
}

impl AlertThresholds {
    pub fn achieved_pct(&self) -> f64 {
        self.achieved_pct
    }

    pub fn warning_pct(&self) -> f64 {
        self.warning_pct
    }

    pub fn critical_days(&self) -> i64 {
        self.critical_days
    }

    /// Sets the percentage at and above which a goal is achieved.
    ///
    /// Default: `100`
    pub fn with_achieved_pct(mut self, pct: f64) -> Self {
        self.achieved_pct = pct;
        self
    }

    /// Sets the percentage at and above which a goal is no longer at risk.
    ///
    /// Default: `80`
    pub fn with_warning_pct(mut self, pct: f64) -> Self {
        self.warning_pct = pct;
        self
    }

    /// Sets the number of remaining days at and below which a goal under the warning threshold
    /// becomes critical.
    ///
    /// Default: `3`
    pub fn with_critical_days(mut self, days: i64) -> Self {
        self.critical_days = days;
        self
    }

    /// Classifies a percentage given the days remaining in its period.
    ///
    /// `Achieved` takes priority over `Critical` regardless of the days remaining, and `Critical`
    /// is checked before the `Warning`/`Normal` split.
    pub fn classify(&self, percentage_achieved: f64, days_remaining: i64) -> AlertLevel {
        if percentage_achieved >= self.achieved_pct {
            AlertLevel::Achieved
        } else if days_remaining <= self.critical_days && percentage_achieved < self.warning_pct {
            AlertLevel::Critical
        } else if percentage_achieved >= self.warning_pct {
            AlertLevel::Warning
        } else {
            AlertLevel::Normal
        }
    }

    /// Classifies `metric` as of `today`.
    pub fn evaluate(&self, metric: &GoalMetric, today: NaiveDate) -> AlertLevel {
        self.classify(metric.percentage_achieved(), metric.days_remaining(today))
    }
}

/// Classifies a percentage with the default [`AlertThresholds`].
///
/// ```
/// use lobbyboard::alert::{AlertLevel, classify};
///
/// assert_eq!(classify(100., 10), AlertLevel::Achieved);
/// assert_eq!(classify(75., 2), AlertLevel::Critical);
/// assert_eq!(classify(85., 1), AlertLevel::Warning);
/// assert_eq!(classify(50., 15), AlertLevel::Normal);
/// ```
pub fn classify(percentage_achieved: f64, days_remaining: i64) -> AlertLevel {
    AlertThresholds::default().classify(percentage_achieved, days_remaining)
}

#![doc = include_str!("../README.md")]

/// Exports [`AlertEngine`], [`AlertThresholds`] and other types related to goal-progress
/// classification and its audio/visual side effects.
///
/// [`AlertEngine`]: crate::alert::AlertEngine
/// [`AlertThresholds`]: crate::alert::AlertThresholds
pub mod alert;
/// Exports [`DisplayModeTracker`], the [`classify`] heuristic and other types related to
/// layout selection.
///
/// [`DisplayModeTracker`]: crate::display::DisplayModeTracker
/// [`classify`]: crate::display::classify
pub mod display;
/// Exports [`ReloadWatchdog`], [`ReloadConfig`] and other types related to periodic session
/// restarts.
///
/// [`ReloadWatchdog`]: crate::reload::ReloadWatchdog
/// [`ReloadConfig`]: crate::reload::ReloadConfig
pub mod reload;
/// Exports [`RotationScheduler`], [`View`] and other types related to timed view cycling.
///
/// [`RotationScheduler`]: crate::rotation::RotationScheduler
/// [`View`]: crate::rotation::View
pub mod rotation;
/// Exports [`DashboardEngine`], [`DashboardSupervisor`] and other types composing a full
/// dashboard session.
///
/// [`DashboardEngine`]: crate::session::DashboardEngine
/// [`DashboardSupervisor`]: crate::session::DashboardSupervisor
pub mod session;
mod shared;
/// Exports [`SyncEngine`] and other types related to live topic synchronization.
///
/// [`SyncEngine`]: crate::sync::SyncEngine
pub mod sync;
mod util;

/// Error types returned by `lobbyboard`.
pub mod error {
    pub use super::reload::error::{ReloadConfigError, ReloadIntervalValidationError};
    pub use super::session::error::SessionError;
    pub use super::shared::error::{GoalMetricValidationError, PeriodValidationError};
    pub use super::sync::{
        error::SyncError,
        process::error::{TopicProcessFatalError, TopicProcessRecoverableError},
    };
    pub use super::util::PanicPayload;

    /// Error type returned by user-supplied fetchers and change sources.
    pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
}

/// Exports the data model shared by the dashboard's topics.
pub mod models {
    pub use super::shared::{
        DashboardSnapshot, GoalMetric, Period, ProposalCard, SalesGoalSnapshot, TeamGoal,
    };
}

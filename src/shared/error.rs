use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodValidationError {
    #[error("Invalid period month {0}, must be between 1 and 12")]
    InvalidMonth(u32),

    #[error("Invalid period year {0}, out of the supported date range")]
    YearOutOfRange(i32),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GoalMetricValidationError {
    #[error("Invalid target value {0}, must be finite and non-negative")]
    InvalidTargetValue(f64),

    #[error("Invalid achieved value {0}, must be finite and non-negative")]
    InvalidAchievedValue(f64),

    #[error("Invalid achieved percentage {0}, must be finite and non-negative")]
    InvalidPercentage(f64),
}

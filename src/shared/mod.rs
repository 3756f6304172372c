use std::{fmt, result::Result};

use chrono::{Datelike, NaiveDate};

use crate::util::NaiveDateExt;

pub mod error;

use error::{GoalMetricValidationError, PeriodValidationError};

/// Calendar month identifying one goal metric instance.
///
/// Two [`GoalMetric`]s with the same period are the same logical entity; a refresh replaces the
/// previous value wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Creates a validated period. `month` is 1-based.
    ///
    /// # Examples
    ///
    /// ```
    /// use lobbyboard::models::Period;
    ///
    /// let period = Period::new(2025, 2).unwrap();
    /// assert_eq!(period.last_day().to_string(), "2025-02-28");
    ///
    /// assert!(Period::new(2025, 13).is_err());
    /// ```
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodValidationError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodValidationError::InvalidMonth(month));
        }

        // Both the first and the last day of the month must be representable
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|first| first.last_day_of_month())
            .ok_or(PeriodValidationError::YearOutOfRange(year))?;

        Ok(Self { year, month })
    }

    /// Returns the period containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Returns the calendar month immediately before this one, or `None` if it falls outside the
    /// supported date range.
    pub fn previous(&self) -> Option<Self> {
        let (year, month) = if self.month == 1 {
            (self.year.checked_sub(1)?, 12)
        } else {
            (self.year, self.month - 1)
        };

        Self::new(year, month).ok()
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("validated on construction")
    }

    pub fn last_day(&self) -> NaiveDate {
        self.first_day()
            .last_day_of_month()
            .expect("validated on construction")
    }

    /// Days between `today` and the last calendar day of the period.
    ///
    /// Zero on the last day, negative once the period is over.
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        today.days_until(self.last_day())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One period's progress toward a numeric target.
///
/// Goal metrics are immutable: every refresh of the backing feed produces a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalMetric {
    period: Period,
    target_value: f64,
    achieved_value: f64,
    percentage_achieved: f64,
}

impl GoalMetric {
    /// Creates a metric whose percentage is computed as `achieved / target * 100`.
    ///
    /// A zero target yields `0.0` percent.
    pub fn new(
        period: Period,
        target_value: f64,
        achieved_value: f64,
    ) -> Result<Self, GoalMetricValidationError> {
        let percentage_achieved = if target_value > 0. {
            achieved_value / target_value * 100.
        } else {
            0.
        };

        Self::with_reported_percentage(period, target_value, achieved_value, percentage_achieved)
    }

    /// Creates a metric using a percentage reported by the backing store, which may be rounded
    /// differently than the raw amounts suggest.
    pub fn with_reported_percentage(
        period: Period,
        target_value: f64,
        achieved_value: f64,
        percentage_achieved: f64,
    ) -> Result<Self, GoalMetricValidationError> {
        if !target_value.is_finite() || target_value < 0. {
            return Err(GoalMetricValidationError::InvalidTargetValue(target_value));
        }

        if !achieved_value.is_finite() || achieved_value < 0. {
            return Err(GoalMetricValidationError::InvalidAchievedValue(
                achieved_value,
            ));
        }

        if !percentage_achieved.is_finite() || percentage_achieved < 0. {
            return Err(GoalMetricValidationError::InvalidPercentage(
                percentage_achieved,
            ));
        }

        Ok(Self {
            period,
            target_value,
            achieved_value,
            percentage_achieved,
        })
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn target_value(&self) -> f64 {
        self.target_value
    }

    pub fn achieved_value(&self) -> f64 {
        self.achieved_value
    }

    /// Achieved percentage, may exceed 100.
    pub fn percentage_achieved(&self) -> f64 {
        self.percentage_achieved
    }

    /// Amount still missing to reach the target, `0.0` once achieved.
    pub fn remaining_value(&self) -> f64 {
        (self.target_value - self.achieved_value).max(0.)
    }

    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        self.period.days_remaining(today)
    }
}

impl fmt::Display for GoalMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.2} / {:.2} ({:.1}%)",
            self.period, self.achieved_value, self.target_value, self.percentage_achieved
        )
    }
}

/// Goal progress of a single team, as shown in the team ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamGoal {
    team: String,
    team_id: Option<String>,
    metric: GoalMetric,
}

impl TeamGoal {
    pub fn new(team: impl Into<String>, team_id: Option<String>, metric: GoalMetric) -> Self {
        Self {
            team: team.into(),
            team_id,
            metric,
        }
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn team_id(&self) -> Option<&str> {
        self.team_id.as_deref()
    }

    pub fn metric(&self) -> &GoalMetric {
        &self.metric
    }
}

/// Snapshot delivered by the sales goal feed.
///
/// Bundles the current period's overall goal (absent until the store has a row for the month),
/// the previous period's achieved percentage, and the per-team goals ranked by percentage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesGoalSnapshot {
    current: Option<GoalMetric>,
    previous_percentage: Option<f64>,
    teams: Vec<TeamGoal>,
}

impl SalesGoalSnapshot {
    pub fn new(
        current: Option<GoalMetric>,
        previous_percentage: Option<f64>,
        mut teams: Vec<TeamGoal>,
    ) -> Self {
        teams.sort_by(|a, b| {
            b.metric
                .percentage_achieved()
                .total_cmp(&a.metric.percentage_achieved())
        });

        Self {
            current,
            previous_percentage,
            teams,
        }
    }

    pub fn current(&self) -> Option<&GoalMetric> {
        self.current.as_ref()
    }

    pub fn previous_percentage(&self) -> Option<f64> {
        self.previous_percentage
    }

    /// Team goals, highest percentage first.
    pub fn teams(&self) -> &[TeamGoal] {
        &self.teams
    }

    /// Percentage points gained (or lost) relative to the previous period.
    pub fn percentage_delta(&self) -> Option<f64> {
        let current = self.current.as_ref()?.percentage_achieved();
        Some(current - self.previous_percentage?)
    }
}

/// A pipeline card listed by the proposal views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalCard {
    pub id: String,
    pub title: String,
    pub board_name: String,
    pub days_remaining: Option<i64>,
}

/// Snapshot type flowing through the dashboard's topics.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardSnapshot {
    SalesGoal(SalesGoalSnapshot),
    Cards(Vec<ProposalCard>),
}

impl DashboardSnapshot {
    /// Returns the current period's goal if this is a sales goal snapshot that has one.
    pub fn goal_metric(&self) -> Option<&GoalMetric> {
        match self {
            Self::SalesGoal(snapshot) => snapshot.current(),
            Self::Cards(_) => None,
        }
    }
}

impl From<SalesGoalSnapshot> for DashboardSnapshot {
    fn from(value: SalesGoalSnapshot) -> Self {
        Self::SalesGoal(value)
    }
}

impl From<Vec<ProposalCard>> for DashboardSnapshot {
    fn from(value: Vec<ProposalCard>) -> Self {
        Self::Cards(value)
    }
}

#[cfg(test)]
mod tests;

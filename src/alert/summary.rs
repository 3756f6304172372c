use crate::shared::{SalesGoalSnapshot, TeamGoal};

use super::core::AlertThresholds;

/// Aggregate view over the per-team goals of a period.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamGoalSummary {
    at_goal: usize,
    near_goal: usize,
    below_goal: usize,
    average_percentage: f64,
    aggregate_percentage: f64,
    total_target_value: f64,
    total_achieved_value: f64,
    best_team: Option<String>,
}

impl TeamGoalSummary {
    /// Buckets `teams` with the same thresholds the alert levels are derived from.
    pub fn new(teams: &[TeamGoal], thresholds: &AlertThresholds) -> Self {
        let mut at_goal = 0;
        let mut near_goal = 0;
        let mut below_goal = 0;
        let mut pct_sum = 0.;
        let mut total_target_value = 0.;
        let mut total_achieved_value = 0.;
        let mut best: Option<&TeamGoal> = None;

        for team in teams {
            let metric = team.metric();
            let pct = metric.percentage_achieved();

            if pct >= thresholds.achieved_pct() {
                at_goal += 1;
            } else if pct >= thresholds.warning_pct() {
                near_goal += 1;
            } else {
                below_goal += 1;
            }

            pct_sum += pct;
            total_target_value += metric.target_value();
            total_achieved_value += metric.achieved_value();

            if best.is_none_or(|b| pct > b.metric().percentage_achieved()) {
                best = Some(team);
            }
        }

        let average_percentage = if teams.is_empty() {
            0.
        } else {
            pct_sum / teams.len() as f64
        };

        let aggregate_percentage = if total_target_value > 0. {
            total_achieved_value / total_target_value * 100.
        } else {
            0.
        };

        Self {
            at_goal,
            near_goal,
            below_goal,
            average_percentage,
            aggregate_percentage,
            total_target_value,
            total_achieved_value,
            best_team: best.map(|team| team.team().to_string()),
        }
    }

    /// Summarizes the team goals of `snapshot` with the default thresholds.
    pub fn from_snapshot(snapshot: &SalesGoalSnapshot) -> Self {
        Self::new(snapshot.teams(), &AlertThresholds::default())
    }

    /// Number of teams at or above their goal.
    pub fn at_goal(&self) -> usize {
        self.at_goal
    }

    /// Number of teams above the warning threshold but still under their goal.
    pub fn near_goal(&self) -> usize {
        self.near_goal
    }

    pub fn below_goal(&self) -> usize {
        self.below_goal
    }

    pub fn team_count(&self) -> usize {
        self.at_goal + self.near_goal + self.below_goal
    }

    pub fn average_percentage(&self) -> f64 {
        self.average_percentage
    }

    /// Sum of achieved values over sum of targets, as a percentage. `0` when no target is set.
    pub fn aggregate_percentage(&self) -> f64 {
        self.aggregate_percentage
    }

    pub fn total_target_value(&self) -> f64 {
        self.total_target_value
    }

    pub fn total_achieved_value(&self) -> f64 {
        self.total_achieved_value
    }

    pub fn best_team(&self) -> Option<&str> {
        self.best_team.as_deref()
    }
}

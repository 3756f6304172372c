use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn period(y: i32, m: u32) -> Period {
    Period::new(y, m).unwrap()
}

#[test]
fn period_rejects_invalid_months() {
    assert_eq!(
        Period::new(2025, 0),
        Err(PeriodValidationError::InvalidMonth(0))
    );
    assert_eq!(
        Period::new(2025, 13),
        Err(PeriodValidationError::InvalidMonth(13))
    );
}

#[test]
fn period_rejects_unrepresentable_years() {
    assert_eq!(
        Period::new(i32::MAX, 1),
        Err(PeriodValidationError::YearOutOfRange(i32::MAX))
    );
}

#[test]
fn period_previous_wraps_year() {
    assert_eq!(period(2025, 1).previous(), Some(period(2024, 12)));
    assert_eq!(period(2025, 7).previous(), Some(period(2025, 6)));
}

#[test]
fn period_previous_stops_at_supported_range() {
    let earliest = Period::containing(NaiveDate::MIN);
    assert_eq!(earliest.previous(), None);

    // Every returned period stays usable
    let next_to_earliest = Period::containing(NaiveDate::MIN.with_month(2).unwrap());
    let previous = next_to_earliest.previous().unwrap();
    assert_eq!(previous.first_day(), NaiveDate::MIN);
}

#[test]
fn period_days_remaining() {
    let p = period(2025, 3);
    assert_eq!(p.days_remaining(date(2025, 3, 1)), 30);
    assert_eq!(p.days_remaining(date(2025, 3, 28)), 3);
    assert_eq!(p.days_remaining(date(2025, 3, 31)), 0);
    assert_eq!(p.days_remaining(date(2025, 4, 1)), -1);
}

#[test]
fn period_display() {
    assert_eq!(period(2025, 3).to_string(), "2025-03");
}

#[test]
fn goal_metric_computes_percentage() {
    let metric = GoalMetric::new(period(2025, 3), 200_000., 150_000.).unwrap();
    assert_eq!(metric.percentage_achieved(), 75.);
    assert_eq!(metric.remaining_value(), 50_000.);
}

#[test]
fn goal_metric_zero_target_is_zero_percent() {
    let metric = GoalMetric::new(period(2025, 3), 0., 10.).unwrap();
    assert_eq!(metric.percentage_achieved(), 0.);
}

#[test]
fn goal_metric_over_achievement() {
    let metric = GoalMetric::new(period(2025, 3), 100., 130.).unwrap();
    assert_eq!(metric.percentage_achieved(), 130.);
    assert_eq!(metric.remaining_value(), 0.);
}

#[test]
fn goal_metric_validation() {
    let p = period(2025, 3);
    assert!(matches!(
        GoalMetric::new(p, -1., 0.),
        Err(GoalMetricValidationError::InvalidTargetValue(_))
    ));
    assert!(matches!(
        GoalMetric::new(p, 1., f64::NAN),
        Err(GoalMetricValidationError::InvalidAchievedValue(_))
    ));
    assert!(matches!(
        GoalMetric::with_reported_percentage(p, 1., 1., f64::INFINITY),
        Err(GoalMetricValidationError::InvalidPercentage(_))
    ));
}

#[test]
fn sales_goal_snapshot_ranks_teams_and_computes_delta() {
    let p = period(2025, 3);
    let team = |name: &str, achieved: f64| {
        TeamGoal::new(name, None, GoalMetric::new(p, 100., achieved).unwrap())
    };

    let snapshot = SalesGoalSnapshot::new(
        Some(GoalMetric::new(p, 100., 82.5).unwrap()),
        Some(70.),
        vec![team("Ana", 40.), team("Bruno", 110.), team("Carla", 85.)],
    );

    let ranked: Vec<_> = snapshot.teams().iter().map(TeamGoal::team).collect();
    assert_eq!(ranked, vec!["Bruno", "Carla", "Ana"]);
    assert_eq!(snapshot.percentage_delta(), Some(12.5));
}

#[test]
fn sales_goal_snapshot_delta_requires_both_periods() {
    let p = period(2025, 3);
    let current = GoalMetric::new(p, 100., 50.).unwrap();

    assert_eq!(
        SalesGoalSnapshot::new(Some(current), None, vec![]).percentage_delta(),
        None
    );
    assert_eq!(
        SalesGoalSnapshot::new(None, Some(50.), vec![]).percentage_delta(),
        None
    );
}

#[test]
fn dashboard_snapshot_goal_metric() {
    let metric = GoalMetric::new(period(2025, 3), 100., 50.).unwrap();
    let goal: DashboardSnapshot = SalesGoalSnapshot::new(Some(metric.clone()), None, vec![]).into();
    assert_eq!(goal.goal_metric(), Some(&metric));

    let cards: DashboardSnapshot = Vec::<ProposalCard>::new().into();
    assert_eq!(cards.goal_metric(), None);
}

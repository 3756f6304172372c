use strum::IntoEnumIterator;
use tokio::time;

use super::*;

fn secs(secs: u64) -> time::Duration {
    time::Duration::from_secs(secs)
}

fn view_changes(rx: &mut RotationReceiver) -> Vec<(View, View)> {
    let mut changes = Vec::new();
    while let Ok(update) = rx.try_recv() {
        if let RotationUpdate::ViewChanged { previous, current } = update {
            changes.push((previous, current));
        }
    }
    changes
}

#[test]
fn test_view_cycle_visits_every_view() {
    let start = View::default();
    let mut view = start;
    let mut visited = Vec::new();

    for _ in 0..View::iter().count() {
        visited.push(view);
        view = view.next();
    }

    assert_eq!(view, start);
    assert_eq!(visited, View::iter().collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_full_cycle_returns_to_start() {
    let scheduler = RotationScheduler::new(RotationConfig::default());
    let mut rx = scheduler.update_receiver();
    scheduler.start();

    time::sleep(secs(150) + time::Duration::from_millis(100)).await;

    let changes = view_changes(&mut rx);
    assert_eq!(changes.len(), 5);
    assert_eq!(changes[0], (View::AwaitingSignature, View::NewProposals));
    assert_eq!(scheduler.active_view(), View::AwaitingSignature);

    scheduler.stop();
}

#[tokio::test(start_paused = true)]
async fn test_start_is_idempotent() {
    let scheduler = RotationScheduler::new(RotationConfig::default());
    let mut rx = scheduler.update_receiver();

    scheduler.start();
    scheduler.start();
    time::sleep(secs(31)).await;

    assert_eq!(view_changes(&mut rx).len(), 1);
    assert_eq!(scheduler.active_view(), View::NewProposals);
}

#[tokio::test(start_paused = true)]
async fn test_pause_is_idempotent() {
    let scheduler = RotationScheduler::new(RotationConfig::default());
    let mut rx = scheduler.update_receiver();
    scheduler.start();
    assert!(scheduler.is_timer_active());

    scheduler.set_paused(true);
    scheduler.set_paused(true);
    assert!(scheduler.is_paused());
    assert!(!scheduler.is_timer_active());

    scheduler.set_paused(false);
    scheduler.set_paused(false);
    assert!(!scheduler.is_paused());
    assert!(scheduler.is_timer_active());

    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    assert_eq!(updates, vec![RotationUpdate::Paused, RotationUpdate::Resumed]);

    // A single timer is alive after resuming
    time::sleep(secs(31)).await;
    assert_eq!(scheduler.active_view(), View::NewProposals);
}

#[tokio::test(start_paused = true)]
async fn test_paused_rotation_does_not_advance() {
    let scheduler = RotationScheduler::new(RotationConfig::default());
    scheduler.start();
    scheduler.set_paused(true);

    time::sleep(secs(300)).await;
    assert_eq!(scheduler.active_view(), View::AwaitingSignature);
}

#[tokio::test(start_paused = true)]
async fn test_resume_waits_full_interval() {
    let scheduler = RotationScheduler::new(RotationConfig::default());
    scheduler.start();

    time::sleep(secs(20)).await;
    scheduler.set_paused(true);
    time::sleep(secs(100)).await;
    scheduler.set_paused(false);

    // The interval elapsed before pausing is not carried over
    time::sleep(secs(29)).await;
    assert_eq!(scheduler.active_view(), View::AwaitingSignature);

    time::sleep(secs(2)).await;
    assert_eq!(scheduler.active_view(), View::NewProposals);
}

#[tokio::test(start_paused = true)]
async fn test_select_view_keeps_timer_phase() {
    let scheduler = RotationScheduler::new(RotationConfig::default());
    let mut rx = scheduler.update_receiver();
    scheduler.start();

    time::sleep(secs(20)).await;
    scheduler.select_view(View::Pending);
    assert_eq!(
        view_changes(&mut rx),
        vec![(View::AwaitingSignature, View::Pending)]
    );

    time::sleep(secs(11)).await;
    assert_eq!(scheduler.active_view(), View::SalesGoal);

    // Selecting the active view is not a change
    scheduler.select_view(View::SalesGoal);
    assert_eq!(
        view_changes(&mut rx),
        vec![(View::Pending, View::SalesGoal)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_editing_handle_pauses_and_resumes_on_drop() {
    let scheduler = RotationScheduler::new(RotationConfig::default());
    scheduler.start();

    let handle = scheduler.editing_handle();
    handle.on_editing_change(true);
    assert!(scheduler.is_paused());
    assert!(handle.is_editing());

    time::sleep(secs(60)).await;
    assert_eq!(scheduler.active_view(), View::AwaitingSignature);

    drop(handle);
    assert!(!scheduler.is_paused());
    assert!(scheduler.is_timer_active());
}

#[tokio::test(start_paused = true)]
async fn test_editing_handle_drop_after_edit_keeps_state() {
    let scheduler = RotationScheduler::new(RotationConfig::default());
    scheduler.start();

    let handle = scheduler.editing_handle();
    handle.on_editing_change(true);
    handle.on_editing_change(false);
    drop(handle);

    assert!(!scheduler.is_paused());
    assert!(scheduler.is_timer_active());
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_timer_and_clears_pause() {
    let scheduler = RotationScheduler::new(
        RotationConfig::default()
            .with_interval(10)
            .with_initial_view(View::SalesGoal),
    );
    scheduler.start();
    scheduler.set_paused(true);

    scheduler.stop();
    assert!(!scheduler.is_running());
    assert!(!scheduler.is_paused());
    assert!(!scheduler.is_timer_active());

    time::sleep(secs(60)).await;
    assert_eq!(scheduler.active_view(), View::SalesGoal);

    scheduler.start();
    time::sleep(secs(11)).await;
    assert_eq!(scheduler.active_view(), View::FlipChart);
}

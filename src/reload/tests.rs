use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use tokio::time;

use super::{
    error::{ReloadConfigError, ReloadIntervalValidationError},
    *,
};

fn counting_handler() -> (Arc<dyn ReloadHandler>, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    let handler: Arc<dyn ReloadHandler> = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (handler, count)
}

fn enabled_config(interval_ms: f64) -> ReloadConfig {
    ReloadConfig::default()
        .with_enabled(true)
        .with_interval_millis(interval_ms)
}

#[test]
fn test_interval_validation() {
    assert!(matches!(
        ReloadInterval::from_millis(500.),
        Err(ReloadIntervalValidationError::BelowMinimum { min_ms: 10_000, .. })
    ));
    assert!(matches!(
        ReloadInterval::from_millis(f64::NAN),
        Err(ReloadIntervalValidationError::NotFinite(_))
    ));
    assert!(matches!(
        ReloadInterval::from_millis(f64::INFINITY),
        Err(ReloadIntervalValidationError::NotFinite(_))
    ));
    assert!(matches!(
        ReloadInterval::from_millis(1e12),
        Err(ReloadIntervalValidationError::AboveMaximum { .. })
    ));

    let interval = ReloadInterval::from_millis(10_000.).unwrap();
    assert_eq!(interval.as_duration(), time::Duration::from_secs(10));
}

#[test]
fn test_invalid_interval_falls_back_to_default() {
    assert_eq!(
        ReloadInterval::from_millis_or_default(500.),
        ReloadInterval::DEFAULT
    );
    assert_eq!(
        ReloadInterval::from_millis_or_default(-1.),
        ReloadInterval::DEFAULT
    );
    assert_eq!(
        ReloadInterval::DEFAULT.as_duration(),
        time::Duration::from_secs(600)
    );
}

#[test]
fn test_config_from_vars() {
    let config = ReloadConfig::from_vars([
        (ENV_AUTO_RELOAD_ENABLED, "1"),
        (ENV_AUTO_RELOAD_MS, "120000"),
        (ENV_AUTO_RELOAD_PAUSE_WHEN_HIDDEN, "false"),
    ]);

    assert!(config.enabled());
    assert!(!config.pause_when_hidden());
    assert_eq!(
        config.interval().as_duration(),
        time::Duration::from_secs(120)
    );
}

#[test]
fn test_config_from_vars_defaults() {
    let config = ReloadConfig::from_vars(Vec::<(String, String)>::new());

    assert_eq!(config, ReloadConfig::default());
    assert_eq!(config.enabled(), !cfg!(debug_assertions));
    assert!(config.pause_when_hidden());
    assert_eq!(config.cooldown(), time::Duration::from_secs(5));
}

#[test]
fn test_config_from_vars_invalid_values_use_defaults() {
    let config = ReloadConfig::from_vars([
        (ENV_AUTO_RELOAD_ENABLED, "yes please"),
        (ENV_AUTO_RELOAD_MS, "500"),
        (ENV_AUTO_RELOAD_PAUSE_WHEN_HIDDEN, "0"),
    ]);

    assert_eq!(config.enabled(), !cfg!(debug_assertions));
    assert_eq!(config.interval(), ReloadInterval::DEFAULT);
    assert!(!config.pause_when_hidden());

    let config = ReloadConfig::from_vars([(ENV_AUTO_RELOAD_MS, "ten minutes")]);
    assert_eq!(config.interval(), ReloadInterval::DEFAULT);
}

#[test]
fn test_config_error_messages() {
    let e = ReloadConfigError::InvalidInterval {
        var: ENV_AUTO_RELOAD_MS,
        source: ReloadIntervalValidationError::NotFinite(f64::NAN),
    };
    assert!(e.to_string().starts_with("`DASHBOARD_AUTO_RELOAD_MS`"));
}

#[tokio::test(start_paused = true)]
async fn test_configure_below_floor_uses_default() {
    let (handler, _) = counting_handler();
    let watchdog = ReloadWatchdog::new(ReloadConfig::default(), handler);

    watchdog.configure(500., true, true);

    assert_eq!(watchdog.config().interval(), ReloadInterval::DEFAULT);
    assert!(watchdog.config().enabled());
}

#[tokio::test(start_paused = true)]
async fn test_timer_issues_reloads() {
    let (handler, count) = counting_handler();
    let watchdog = ReloadWatchdog::new(enabled_config(10_000.), handler);
    watchdog.start();

    time::sleep(time::Duration::from_millis(9_900)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);

    time::sleep(time::Duration::from_millis(200)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    time::sleep(time::Duration::from_secs(10)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);

    watchdog.stop();
    assert!(!watchdog.is_timer_active());
    time::sleep(time::Duration::from_secs(60)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_suppresses_double_fire() {
    let (handler, count) = counting_handler();
    let watchdog = ReloadWatchdog::new(enabled_config(10_000.), handler);

    assert_eq!(watchdog.trigger_reload(), ReloadOutcome::Issued);
    time::sleep(time::Duration::from_secs(2)).await;
    assert_eq!(
        watchdog.trigger_reload(),
        ReloadOutcome::Suppressed {
            remaining: time::Duration::from_secs(3)
        }
    );
    assert_eq!(count.load(Ordering::SeqCst), 1);

    time::sleep(time::Duration::from_secs(3)).await;
    assert_eq!(watchdog.trigger_reload(), ReloadOutcome::Issued);
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_watchdog_runs_no_timer() {
    let (handler, count) = counting_handler();
    let watchdog = ReloadWatchdog::new(
        ReloadConfig::default()
            .with_enabled(false)
            .with_interval_millis(10_000.),
        handler,
    );
    watchdog.start();
    assert!(!watchdog.is_timer_active());

    time::sleep(time::Duration::from_secs(60)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);

    // Disabling cancels a running timer
    watchdog.configure(10_000., true, true);
    assert!(watchdog.is_timer_active());
    watchdog.configure(10_000., false, true);
    assert!(!watchdog.is_timer_active());
}

#[tokio::test(start_paused = true)]
async fn test_start_is_idempotent() {
    let (handler, _) = counting_handler();
    let watchdog = ReloadWatchdog::new(enabled_config(10_000.), handler);
    let mut rx = watchdog.update_receiver();

    watchdog.start();
    watchdog.start();

    let mut started = 0;
    while let Ok(update) = rx.try_recv() {
        if matches!(update, ReloadUpdate::TimerStarted { .. }) {
            started += 1;
        }
    }
    assert_eq!(started, 1);
}

#[tokio::test(start_paused = true)]
async fn test_hidden_display_pauses_timer() {
    let (handler, count) = counting_handler();
    let watchdog = ReloadWatchdog::new(enabled_config(10_000.), handler);
    watchdog.start();

    time::sleep(time::Duration::from_secs(8)).await;
    watchdog.set_visibility(Visibility::Hidden);
    assert!(!watchdog.is_timer_active());

    time::sleep(time::Duration::from_secs(100)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);

    // Returning starts a fresh interval instead of firing immediately
    watchdog.set_visibility(Visibility::Visible);
    time::sleep(time::Duration::from_secs(9)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);

    time::sleep(time::Duration::from_secs(2)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hidden_display_ignored_without_pause_when_hidden() {
    let (handler, count) = counting_handler();
    let watchdog = ReloadWatchdog::new(
        enabled_config(10_000.).with_pause_when_hidden(false),
        handler,
    );
    watchdog.start();
    watchdog.set_visibility(Visibility::Hidden);
    assert!(watchdog.is_timer_active());

    time::sleep(time::Duration::from_millis(10_100)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

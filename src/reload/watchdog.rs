use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use tokio::{
    sync::broadcast,
    time::{self, Instant, MissedTickBehavior},
};

use crate::util::AbortOnDropHandle;

use super::config::{ReloadConfig, ReloadInterval};

/// Performs the actual reload. Implementations restart the whole session from scratch.
pub trait ReloadHandler: Send + Sync + 'static {
    fn reload(&self);
}

impl<F> ReloadHandler for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn reload(&self) {
        self()
    }
}

/// Whether the display is currently visible (screen on, window in front).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Result of a reload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Issued,
    /// A reload was issued less than the cooldown ago.
    Suppressed { remaining: time::Duration },
}

/// Update events emitted by the [`ReloadWatchdog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadUpdate {
    TimerStarted { interval: ReloadInterval },
    TimerStopped,
    ReloadIssued,
    ReloadSuppressed { remaining: time::Duration },
}

impl fmt::Display for ReloadUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimerStarted { interval } => write!(f, "Reload timer started ({interval})"),
            Self::TimerStopped => write!(f, "Reload timer stopped"),
            Self::ReloadIssued => write!(f, "Reload issued"),
            Self::ReloadSuppressed { remaining } => {
                write!(f, "Reload suppressed, cooling down for {remaining:?}")
            }
        }
    }
}

/// Receiver for subscribing to [`ReloadUpdate`]s.
pub type ReloadReceiver = broadcast::Receiver<ReloadUpdate>;

/// Issues reloads, enforcing the minimum spacing between two of them. Shared with the timer task.
struct ReloadIssuer {
    cooldown: time::Duration,
    last_reload_at: Mutex<Option<Instant>>,
    handler: Arc<dyn ReloadHandler>,
    update_tx: broadcast::Sender<ReloadUpdate>,
}

impl ReloadIssuer {
    fn send(&self, update: ReloadUpdate) {
        // Ignore no-receivers errors
        let _ = self.update_tx.send(update);
    }

    fn issue(&self) -> ReloadOutcome {
        let mut last_reload_at = self
            .last_reload_at
            .lock()
            .expect("`ReloadIssuer` mutex can't be poisoned");

        let now = Instant::now();

        if let Some(last) = *last_reload_at {
            let elapsed = now.duration_since(last);
            if elapsed < self.cooldown {
                drop(last_reload_at);

                let remaining = self.cooldown - elapsed;
                tracing::warn!(?remaining, "reload suppressed by cooldown");
                self.send(ReloadUpdate::ReloadSuppressed { remaining });

                return ReloadOutcome::Suppressed { remaining };
            }
        }

        *last_reload_at = Some(now);
        drop(last_reload_at);

        tracing::info!("issuing reload");
        self.send(ReloadUpdate::ReloadIssued);
        self.handler.reload();

        ReloadOutcome::Issued
    }
}

impl fmt::Debug for ReloadIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadIssuer")
            .field("cooldown", &self.cooldown)
            .field("last_reload_at", &self.last_reload_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct WatchdogControl {
    config: ReloadConfig,
    running: bool,
    visibility: Visibility,
    timer: Option<AbortOnDropHandle<()>>,
}

impl WatchdogControl {
    fn should_tick(&self) -> bool {
        let hidden_pause =
            self.config.pause_when_hidden() && self.visibility == Visibility::Hidden;

        self.running && self.config.enabled() && !hidden_pause
    }
}

/// Periodically restarts the session as a blunt recovery mechanism against state drift.
///
/// The watchdog owns at most one timer, alive only while it is started, enabled and (if
/// configured to pause when hidden) the display is visible. The timer is rebuilt from scratch
/// whenever it comes back, so returning to a visible display never fires a stale reload.
#[derive(Debug)]
pub struct ReloadWatchdog {
    issuer: Arc<ReloadIssuer>,
    control: Mutex<WatchdogControl>,
}

impl ReloadWatchdog {
    pub fn new(config: impl Into<ReloadConfig>, handler: Arc<dyn ReloadHandler>) -> Self {
        let config = config.into();

        let (update_tx, _) = broadcast::channel::<ReloadUpdate>(config.update_channel_capacity());

        let issuer = Arc::new(ReloadIssuer {
            cooldown: config.cooldown(),
            last_reload_at: Mutex::new(None),
            handler,
            update_tx,
        });

        Self {
            issuer,
            control: Mutex::new(WatchdogControl {
                config,
                running: false,
                visibility: Visibility::default(),
                timer: None,
            }),
        }
    }

    fn lock_control(&self) -> MutexGuard<'_, WatchdogControl> {
        self.control
            .lock()
            .expect("`ReloadWatchdog` mutex can't be poisoned")
    }

    fn spawn_timer(&self, interval: ReloadInterval) -> AbortOnDropHandle<()> {
        let period = interval.as_duration();
        let issuer = self.issuer.clone();

        tokio::spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;
                issuer.issue();
            }
        })
        .into()
    }

    /// Brings the timer in line with the current control flags.
    fn sync_timer(&self, control: &mut WatchdogControl) {
        let should_tick = control.should_tick();

        if should_tick && control.timer.is_none() {
            let interval = control.config.interval();
            control.timer = Some(self.spawn_timer(interval));

            tracing::debug!(%interval, "reload timer started");
            self.issuer.send(ReloadUpdate::TimerStarted { interval });
        } else if !should_tick && control.timer.take().is_some() {
            tracing::debug!("reload timer stopped");
            self.issuer.send(ReloadUpdate::TimerStopped);
        }
    }

    /// Applies new timer settings. Invalid intervals are replaced by
    /// [`ReloadInterval::DEFAULT`]. A running timer restarts with a full interval when the
    /// settings change.
    pub fn configure(&self, interval_ms: f64, enabled: bool, pause_when_hidden: bool) {
        let mut control = self.lock_control();

        let config = control
            .config
            .clone()
            .with_interval_millis(interval_ms)
            .with_enabled(enabled)
            .with_pause_when_hidden(pause_when_hidden);

        if config == control.config {
            return;
        }

        control.config = config;

        if control.timer.take().is_some() {
            self.issuer.send(ReloadUpdate::TimerStopped);
        }
        self.sync_timer(&mut control);
    }

    /// Starts the watchdog. Calling it again while started has no effect. Must be called from
    /// within a tokio runtime.
    pub fn start(&self) {
        let mut control = self.lock_control();
        control.running = true;
        self.sync_timer(&mut control);
    }

    /// Stops the watchdog, cancelling its timer.
    pub fn stop(&self) {
        let mut control = self.lock_control();
        control.running = false;
        self.sync_timer(&mut control);
    }

    /// Reports a display visibility change.
    pub fn set_visibility(&self, visibility: Visibility) {
        let mut control = self.lock_control();
        if control.visibility == visibility {
            return;
        }

        control.visibility = visibility;
        self.sync_timer(&mut control);
    }

    /// Requests an immediate reload, subject to the cooldown shared with the timer.
    pub fn trigger_reload(&self) -> ReloadOutcome {
        self.issuer.issue()
    }

    pub fn config(&self) -> ReloadConfig {
        self.lock_control().config.clone()
    }

    pub fn visibility(&self) -> Visibility {
        self.lock_control().visibility
    }

    /// Returns `true` if a reload timer is currently alive.
    pub fn is_timer_active(&self) -> bool {
        self.lock_control().timer.is_some()
    }

    pub fn update_receiver(&self) -> ReloadReceiver {
        self.issuer.update_tx.subscribe()
    }
}

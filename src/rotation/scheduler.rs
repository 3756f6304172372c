use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
};

use tokio::{
    sync::broadcast,
    time::{self, Instant, MissedTickBehavior},
};

use crate::util::AbortOnDropHandle;

use super::{
    config::RotationConfig,
    core::View,
    state::{RotationReceiver, RotationStateManager, RotationUpdate},
};

#[derive(Debug, Default)]
struct RotationControl {
    running: bool,
    paused: bool,
    timer: Option<AbortOnDropHandle<()>>,
}

/// Advances the active [`View`] on a fixed cadence.
///
/// The scheduler owns at most one timer. The timer only exists while the scheduler is running
/// and not paused: pausing tears it down, and resuming spawns a fresh one, so the first advance
/// after resuming always waits a full interval.
#[derive(Debug)]
pub struct RotationScheduler {
    config: RotationConfig,
    state: Arc<RotationStateManager>,
    control: Mutex<RotationControl>,
}

impl RotationScheduler {
    pub fn new(config: impl Into<RotationConfig>) -> Arc<Self> {
        let config = config.into();

        let (update_tx, _) =
            broadcast::channel::<RotationUpdate>(config.update_channel_capacity());

        let state = Arc::new(RotationStateManager::new(config.initial_view(), update_tx));

        Arc::new(Self {
            config,
            state,
            control: Mutex::new(RotationControl::default()),
        })
    }

    fn lock_control(&self) -> MutexGuard<'_, RotationControl> {
        self.control
            .lock()
            .expect("`RotationScheduler` mutex can't be poisoned")
    }

    fn spawn_timer(&self) -> AbortOnDropHandle<()> {
        let interval = self.config.interval();
        let state = self.state.clone();

        tokio::spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + interval, interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;
                state.switch(View::next);
            }
        })
        .into()
    }

    /// Brings the timer in line with the running and paused flags.
    fn sync_timer(&self, control: &mut RotationControl) {
        let should_tick = control.running && !control.paused;

        if !should_tick {
            control.timer = None;
        } else if control.timer.is_none() {
            control.timer = Some(self.spawn_timer());
        }
    }

    /// Starts rotating. Calling it again while running has no effect. Must be called from within
    /// a tokio runtime.
    pub fn start(&self) {
        let mut control = self.lock_control();
        control.running = true;
        self.sync_timer(&mut control);
    }

    /// Stops rotating and clears the paused flag, so a later [`start`](Self::start) is never
    /// blocked by a stale pause.
    pub fn stop(&self) {
        let mut control = self.lock_control();
        control.running = false;
        control.paused = false;
        self.sync_timer(&mut control);
    }

    /// Pauses or resumes rotation. Repeated calls with the same value have no effect.
    pub fn set_paused(&self, paused: bool) {
        let mut control = self.lock_control();
        if control.paused == paused {
            return;
        }

        control.paused = paused;
        self.sync_timer(&mut control);
        drop(control);

        tracing::debug!(paused, "rotation pause toggled");

        self.state.send(if paused {
            RotationUpdate::Paused
        } else {
            RotationUpdate::Resumed
        });
    }

    /// Switches to `view` immediately. The timer is left untouched.
    pub fn select_view(&self, view: View) {
        self.state.switch(|_| view);
    }

    pub fn active_view(&self) -> View {
        self.state.active_view()
    }

    pub fn is_paused(&self) -> bool {
        self.lock_control().paused
    }

    pub fn is_running(&self) -> bool {
        self.lock_control().running
    }

    /// Returns `true` if a rotation timer is currently alive.
    pub fn is_timer_active(&self) -> bool {
        self.lock_control().timer.is_some()
    }

    pub fn update_receiver(&self) -> RotationReceiver {
        self.state.update_receiver()
    }

    /// Returns a handle for an editing surface to pause rotation while editing.
    pub fn editing_handle(self: &Arc<Self>) -> EditingHandle {
        EditingHandle {
            scheduler: self.clone(),
            editing: AtomicBool::new(false),
        }
    }
}

/// Connection between an editing surface and the [`RotationScheduler`].
///
/// Rotation is paused while the surface reports an edit in progress. Dropping the handle while
/// editing resumes rotation.
#[derive(Debug)]
pub struct EditingHandle {
    scheduler: Arc<RotationScheduler>,
    editing: AtomicBool,
}

impl EditingHandle {
    pub fn on_editing_change(&self, editing: bool) {
        self.editing.store(editing, Ordering::SeqCst);
        self.scheduler.set_paused(editing);
    }

    pub fn is_editing(&self) -> bool {
        self.editing.load(Ordering::SeqCst)
    }
}

impl Drop for EditingHandle {
    fn drop(&mut self) {
        if self.editing.swap(false, Ordering::SeqCst) {
            self.scheduler.set_paused(false);
        }
    }
}

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use tokio::{sync::broadcast, time};

use crate::{shared::GoalMetric, util::AbortOnDropHandle};

use super::{
    config::AlertConfig,
    core::{AlertLevel, AudioCue},
    state::{AlertReceiver, AlertTransmitter, AlertUpdate, CelebrationState},
};

#[derive(Debug, Default)]
struct AlertEngineState {
    level: Option<AlertLevel>,
    critical_cue_fired: bool,
    celebration_handle: Option<AbortOnDropHandle<()>>,
}

/// Turns goal snapshots into alert levels and level-transition side effects.
///
/// Classification itself is stateless. The engine only remembers the last level so that cues and
/// the celebratory effect fire once per transition rather than once per observed snapshot.
///
/// - Entering [`AlertLevel::Achieved`] emits [`AudioCue::Success`] immediately, shows the
///   celebratory effect after the configured delay and clears it once the configured duration
///   has elapsed since the transition.
/// - Entering [`AlertLevel::Critical`] emits [`AudioCue::Warning`], at most once per engine.
/// - Leaving [`AlertLevel::Achieved`] cancels the pending effect and clears it if shown.
#[derive(Debug)]
pub struct AlertEngine {
    config: AlertConfig,
    state: Mutex<AlertEngineState>,
    celebration: Arc<CelebrationState>,
    update_tx: AlertTransmitter,
}

impl AlertEngine {
    pub fn new(config: impl Into<AlertConfig>) -> Self {
        let config = config.into();

        let (update_tx, _) = broadcast::channel::<AlertUpdate>(config.update_channel_capacity());

        Self {
            config,
            state: Mutex::new(AlertEngineState::default()),
            celebration: Arc::new(CelebrationState::new(update_tx.clone())),
            update_tx,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, AlertEngineState> {
        self.state
            .lock()
            .expect("`AlertEngine` mutex can't be poisoned")
    }

    pub fn update_receiver(&self) -> AlertReceiver {
        self.update_tx.subscribe()
    }

    /// Returns the last observed level, or `None` if nothing was observed yet.
    pub fn level(&self) -> Option<AlertLevel> {
        self.lock_state().level
    }

    /// Returns `true` while the celebratory effect is shown.
    pub fn celebration_visible(&self) -> bool {
        self.celebration.is_visible()
    }

    fn spawn_celebration(&self) -> AbortOnDropHandle<()> {
        let delay = self.config.celebration_delay();
        let remaining = self.config.celebration_duration().saturating_sub(delay);
        let celebration = self.celebration.clone();
        let generation = celebration.begin();

        tokio::spawn(async move {
            time::sleep(delay).await;
            celebration.set_visible(generation, true);

            time::sleep(remaining).await;
            celebration.set_visible(generation, false);
        })
        .into()
    }

    /// Classifies `metric` as of `today` and fires the side effects of a level transition.
    ///
    /// A missing metric (no goal set for the period) is classified as [`AlertLevel::Normal`].
    /// Must be called from within a tokio runtime.
    pub fn observe(&self, metric: Option<&GoalMetric>, today: NaiveDate) -> AlertLevel {
        let current = metric
            .map(|metric| self.config.thresholds().evaluate(metric, today))
            .unwrap_or(AlertLevel::Normal);

        let mut state = self.lock_state();
        let previous = state.level.replace(current);

        if previous == Some(current) {
            return current;
        }

        tracing::info!(?previous, %current, "alert level changed");

        let mut cues = Vec::new();

        if current.is_achieved() {
            cues.push(AudioCue::Success);
            state.celebration_handle = Some(self.spawn_celebration());
        } else if previous.is_some_and(|level| level.is_achieved()) {
            state.celebration_handle = None;
            self.celebration.cancel();
        }

        if current.is_critical() && !state.critical_cue_fired {
            state.critical_cue_fired = true;
            cues.push(AudioCue::Warning);
        }

        drop(state);

        // Ignore no-receivers errors
        let _ = self
            .update_tx
            .send(AlertUpdate::LevelChanged { previous, current });
        for cue in cues {
            let _ = self.update_tx.send(AlertUpdate::AudioCue(cue));
        }

        current
    }

    /// Cancels the pending celebratory show/clear actions and clears the effect if shown.
    pub fn cancel_pending(&self) {
        let mut state = self.lock_state();
        state.celebration_handle = None;
        self.celebration.cancel();
    }
}

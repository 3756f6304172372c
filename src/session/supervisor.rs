use std::{
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::{
    sync::{broadcast, mpsc},
    time,
};
use uuid::Uuid;

use crate::{reload::ReloadHandler, util::AbortOnDropHandle};

use super::{
    engine::{DashboardController, DashboardEngine},
    error::{Result, SessionError},
};

/// Builds a fresh, not yet started, session.
pub trait SessionFactory: Send + Sync + 'static {
    fn build(&self) -> Result<DashboardEngine>;
}

impl<F> SessionFactory for F
where
    F: Fn() -> Result<DashboardEngine> + Send + Sync + 'static,
{
    fn build(&self) -> Result<DashboardEngine> {
        self()
    }
}

/// Update events emitted by the [`DashboardSupervisor`].
#[derive(Debug, Clone)]
pub enum SupervisorUpdate {
    SessionStarted(Arc<DashboardController>),
    SessionEnded { session_id: Uuid },
    /// The factory failed. The supervisor stops.
    FactoryFailed(Arc<SessionError>),
}

/// Receiver for subscribing to [`SupervisorUpdate`]s.
pub type SupervisorReceiver = broadcast::Receiver<SupervisorUpdate>;

/// Reload handler requesting a restart from the supervisor loop. Requests made while one is
/// already queued are collapsed.
struct RestartRequester(mpsc::Sender<()>);

impl ReloadHandler for RestartRequester {
    fn reload(&self) {
        let _ = self.0.try_send(());
    }
}

#[derive(Debug, Default)]
struct SupervisorState {
    current: Mutex<Option<Arc<DashboardController>>>,
    restarts: AtomicU64,
}

impl SupervisorState {
    fn set_current(&self, controller: Option<Arc<DashboardController>>) {
        *self
            .current
            .lock()
            .expect("`SupervisorState` mutex can't be poisoned") = controller;
    }
}

/// Keeps one dashboard session alive, rebuilding it from scratch on every reload.
///
/// A reload issued by the session's watchdog (timer or
/// [`request_reload`](DashboardController::request_reload)) shuts the current session down and
/// starts a brand-new one from the factory: new synchronization layer, new alert state, new
/// timers.
pub struct DashboardSupervisor {
    handle: Mutex<Option<AbortOnDropHandle<()>>>,
    shutdown_tx: broadcast::Sender<()>,
    update_tx: broadcast::Sender<SupervisorUpdate>,
    state: Arc<SupervisorState>,
}

impl DashboardSupervisor {
    /// Maximum time [`shutdown`](Self::shutdown) waits for the current session to stop.
    pub const SHUTDOWN_TIMEOUT: time::Duration = time::Duration::from_secs(20);

    /// Starts the first session and returns immediately. Must be called from within a tokio
    /// runtime.
    pub fn start(factory: impl SessionFactory) -> Arc<Self> {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let (update_tx, _) = broadcast::channel::<SupervisorUpdate>(100);
        let state = Arc::new(SupervisorState::default());

        let handle = tokio::spawn(Self::run(
            factory,
            shutdown_rx,
            update_tx.clone(),
            state.clone(),
        ))
        .into();

        Arc::new(Self {
            handle: Mutex::new(Some(handle)),
            shutdown_tx,
            update_tx,
            state,
        })
    }

    async fn run(
        factory: impl SessionFactory,
        mut shutdown_rx: broadcast::Receiver<()>,
        update_tx: broadcast::Sender<SupervisorUpdate>,
        state: Arc<SupervisorState>,
    ) {
        let (restart_tx, mut restart_rx) = mpsc::channel::<()>(1);
        let reload_handler: Arc<dyn ReloadHandler> = Arc::new(RestartRequester(restart_tx));

        loop {
            let engine = match factory.build() {
                Ok(engine) => engine,
                Err(e) => {
                    tracing::error!(error = %e, "session factory failed");
                    let _ = update_tx.send(SupervisorUpdate::FactoryFailed(Arc::new(e)));
                    return;
                }
            };

            let controller = engine.start(reload_handler.clone());
            let session_id = controller.session_id();

            state.set_current(Some(controller.clone()));
            let _ = update_tx.send(SupervisorUpdate::SessionStarted(controller.clone()));

            let restart = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => false,
                _ = restart_rx.recv() => true,
            };

            if let Err(e) = controller.shutdown().await {
                tracing::warn!(%session_id, error = %e, "session shutdown incomplete");
            }

            state.set_current(None);
            let _ = update_tx.send(SupervisorUpdate::SessionEnded { session_id });

            if !restart {
                return;
            }

            // Drop requests issued while the old session was stopping
            while restart_rx.try_recv().is_ok() {}

            let restarts = state.restarts.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::info!(%session_id, restarts, "restarting session");
        }
    }

    /// Returns the controller of the running session, if any.
    pub fn controller(&self) -> Option<Arc<DashboardController>> {
        self.state
            .current
            .lock()
            .expect("`SupervisorState` mutex can't be poisoned")
            .clone()
    }

    /// Number of restarts performed so far.
    pub fn restart_count(&self) -> u64 {
        self.state.restarts.load(Ordering::SeqCst)
    }

    pub fn update_receiver(&self) -> SupervisorReceiver {
        self.update_tx.subscribe()
    }

    fn try_consume_handle(&self) -> Option<AbortOnDropHandle<()>> {
        self.handle
            .lock()
            .expect("`DashboardSupervisor` mutex can't be poisoned")
            .take()
    }

    /// Shuts the current session down and stops restarting. This method can only be called once
    /// per supervisor instance.
    pub async fn shutdown(&self) -> Result<()> {
        let Some(mut handle) = self.try_consume_handle() else {
            return Err(SessionError::SessionAlreadyShutdown);
        };

        if handle.is_finished() {
            return handle.await.map_err(SessionError::ProcessTaskJoin);
        }

        if let Err(e) = self.shutdown_tx.send(()) {
            handle.abort();
            return Err(SessionError::SendShutdownSignalFailed(e));
        }

        tokio::select! {
            join_res = &mut handle => join_res.map_err(SessionError::ProcessTaskJoin),
            _ = time::sleep(Self::SHUTDOWN_TIMEOUT) => {
                handle.abort();
                Err(SessionError::ShutdownTimeout)
            }
        }
    }
}

impl fmt::Debug for DashboardSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardSupervisor")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

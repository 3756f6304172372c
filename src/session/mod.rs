//! Composition of every component into one dashboard session.

mod config;
mod engine;
pub(crate) mod error;
mod process;
mod state;
mod supervisor;

pub use config::SessionConfig;
pub use engine::{DashboardController, DashboardEngine};
pub use state::{SessionReceiver, SessionStatus, SessionUpdate};
pub use supervisor::{DashboardSupervisor, SessionFactory, SupervisorReceiver, SupervisorUpdate};

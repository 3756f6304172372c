//! Example running a supervised dashboard session against an in-memory change hub, without any
//! presentation layer.
//!
//! A background task simulates the backing store: every few seconds the monthly sales total
//! grows and a change notification is published for the goal topic. Session events are printed
//! as they arrive.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use chrono::Local;
use dotenvy::dotenv;
use tokio::time::{self, Duration};
use tracing_subscriber::EnvFilter;

use lobbyboard::{
    error::{BoxError, SessionError},
    models::{DashboardSnapshot, GoalMetric, Period, ProposalCard, SalesGoalSnapshot},
    reload::ReloadConfig,
    rotation::RotationConfig,
    session::{
        DashboardEngine, DashboardSupervisor, SessionConfig, SessionUpdate, SupervisorUpdate,
    },
    sync::{ChangeKind, LocalChangeHub, SyncUpdate, TopicName, fetcher_fn},
};

const GOAL_TOPIC: &str = "sales_goal";
const TARGET_VALUE: f64 = 100_000.;

fn goal_snapshot(achieved: u64) -> Result<DashboardSnapshot, BoxError> {
    let period = Period::containing(Local::now().date_naive());
    let metric = GoalMetric::new(period, TARGET_VALUE, achieved as f64)?;

    Ok(SalesGoalSnapshot::new(Some(metric), Some(92.5), Vec::new()).into())
}

fn sample_cards(prefix: &str) -> DashboardSnapshot {
    let cards = (1..=3)
        .map(|i| ProposalCard {
            id: format!("{prefix}-{i}"),
            title: format!("Proposal {i}"),
            board_name: prefix.to_string(),
            days_remaining: Some(i * 2),
        })
        .collect();

    DashboardSnapshot::Cards(cards)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let hub = LocalChangeHub::new(64);
    let achieved = Arc::new(AtomicU64::new(70_000));

    let config = SessionConfig::default()
        .with_reload(ReloadConfig::from_env())
        .with_rotation(RotationConfig::default().with_interval(5));

    println!("Initializing `DashboardSupervisor`...");

    let supervisor = DashboardSupervisor::start({
        let hub = hub.clone();
        let achieved = achieved.clone();

        move || -> Result<DashboardEngine, SessionError> {
            let mut engine = DashboardEngine::new(config.clone(), hub.clone());

            let achieved = achieved.clone();
            engine.register_goal_topic(
                GOAL_TOPIC,
                fetcher_fn(move || {
                    let value = achieved.load(Ordering::SeqCst);
                    async move { goal_snapshot(value) }
                }),
            )?;

            for topic in ["awaiting_signature", "new_proposals", "pending"] {
                engine.register_topic(
                    topic,
                    fetcher_fn(move || async move { Ok::<_, BoxError>(sample_cards(topic)) }),
                )?;
            }

            Ok(engine)
        }
    });

    let mut supervisor_rx = supervisor.update_receiver();

    tokio::spawn(async move {
        while let Ok(update) = supervisor_rx.recv().await {
            let controller = match update {
                SupervisorUpdate::SessionStarted(controller) => controller,
                SupervisorUpdate::SessionEnded { session_id } => {
                    println!("\nSession {session_id} ended");
                    continue;
                }
                SupervisorUpdate::FactoryFailed(e) => {
                    eprintln!("\nSession factory failed: {e}");
                    break;
                }
            };

            println!("\nSession {} started", controller.session_id());
            controller.on_resize(1920, 1080);

            let mut session_rx = controller.update_receiver();
            tokio::spawn(async move {
                while let Ok(update) = session_rx.recv().await {
                    match update {
                        SessionUpdate::Status(status) => println!("status: {status}"),
                        SessionUpdate::Sync(SyncUpdate::Status { topic, status }) => {
                            println!("topic {topic}: {status}")
                        }
                        SessionUpdate::Sync(SyncUpdate::Snapshot(snapshot)) => {
                            if let Some(metric) = snapshot.data().goal_metric() {
                                println!("goal: {:.1}%", metric.percentage_achieved());
                            }
                        }
                        SessionUpdate::ViewChanged { current, .. } => println!("view: {current}"),
                        SessionUpdate::AlertLevel(level) => println!("alert level: {level}"),
                        SessionUpdate::AudioCue(cue) => println!("play {cue} cue"),
                        SessionUpdate::CelebrationVisible(visible) => {
                            println!("celebration visible: {visible}")
                        }
                        other => println!("{other:?}"),
                    }
                }
            });
        }
    });

    let goal_topic = TopicName::from(GOAL_TOPIC);
    for _ in 0..8 {
        time::sleep(Duration::from_secs(4)).await;

        let total = achieved.fetch_add(5_000, Ordering::SeqCst) + 5_000;
        println!("\nSales total is now {total}");

        hub.notify(&goal_topic, ChangeKind::Update);
    }

    if let Some(controller) = supervisor.controller() {
        println!("\nRequesting a full reload...");
        controller.request_reload();
        time::sleep(Duration::from_secs(2)).await;
    }

    println!("\nShutting down...");
    supervisor.shutdown().await?;

    // Delay for printing all remaining updates
    time::sleep(Duration::from_millis(100)).await;

    Ok(())
}

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::{sync::Semaphore, time};

use crate::error::BoxError;

use super::{
    error::SyncError,
    process::error::{TopicProcessFatalError, TopicProcessRecoverableError},
    *,
};

/// Fetcher returning its own call number. Each call waits for a permit from `gate`.
#[derive(Clone)]
struct GatedFetcher {
    calls: Arc<AtomicUsize>,
    gate: Arc<Semaphore>,
    fail: Arc<AtomicBool>,
}

impl GatedFetcher {
    fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            gate: Arc::new(Semaphore::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn release(&self, fetches: usize) {
        self.gate.add_permits(fetches);
    }

    fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TopicFetcher<usize> for GatedFetcher {
    async fn fetch(&self) -> Result<usize, BoxError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        self.gate.acquire().await?.forget();

        if self.fail.load(Ordering::SeqCst) {
            return Err("store unavailable".into());
        }

        Ok(call)
    }
}

struct UnavailableSource;

#[async_trait]
impl ChangeSource for UnavailableSource {
    async fn open(&self, _topic: &TopicName) -> Result<ChangeReceiver, BoxError> {
        Err("connection refused".into())
    }
}

/// Source whose subscription handshake never completes.
struct HungSource;

#[async_trait]
impl ChangeSource for HungSource {
    async fn open(&self, _topic: &TopicName) -> Result<ChangeReceiver, BoxError> {
        std::future::pending().await
    }
}

/// Source opening `hub` channels once `gate` hands out a permit.
struct DelayedSource {
    hub: Arc<LocalChangeHub>,
    gate: Arc<Semaphore>,
}

#[async_trait]
impl ChangeSource for DelayedSource {
    async fn open(&self, topic: &TopicName) -> Result<ChangeReceiver, BoxError> {
        self.gate.acquire().await?.forget();
        self.hub.open(topic).await
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    time::timeout(time::Duration::from_secs(5), async {
        while !condition() {
            time::sleep(time::Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

/// Lets every spawned task run until it blocks.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn snapshot_value(reader: &Arc<dyn SyncReader<usize>>, topic: &TopicName) -> Option<usize> {
    reader.snapshot(topic).map(|snapshot| **snapshot.data())
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_notifications_coalesces_into_one_trailing_fetch() {
    let hub = LocalChangeHub::new(16);
    let topic = TopicName::from("cards");
    let fetcher = GatedFetcher::new();

    let mut engine = SyncEngine::new(SyncConfig::default(), hub.clone());
    engine.register_topic(topic.clone(), fetcher.clone()).unwrap();
    let controller = engine.start();
    let reader = controller.reader();

    wait_until(|| fetcher.calls() == 1 && hub.subscriber_count(&topic) == 1).await;

    for _ in 0..5 {
        hub.notify(&topic, ChangeKind::Update);
    }
    settle().await;

    // Initial fetch is still in flight
    assert_eq!(fetcher.calls(), 1);

    fetcher.release(1);
    wait_until(|| fetcher.calls() == 2).await;
    assert_eq!(snapshot_value(&reader, &topic), Some(1));

    fetcher.release(1);
    wait_until(|| snapshot_value(&reader, &topic) == Some(2)).await;

    settle().await;
    time::sleep(time::Duration::from_secs(1)).await;
    assert_eq!(fetcher.calls(), 2);
    assert!(matches!(
        reader.topic_status(&topic),
        Some(TopicStatus::Synced)
    ));

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_notification_while_idle_triggers_fetch() {
    let hub = LocalChangeHub::new(16);
    let topic = TopicName::from("cards");
    let fetcher = GatedFetcher::new();
    fetcher.release(10);

    let mut engine = SyncEngine::new(SyncConfig::default(), hub.clone());
    engine.register_topic(topic.clone(), fetcher.clone()).unwrap();
    let controller = engine.start();
    let reader = controller.reader();

    wait_until(|| snapshot_value(&reader, &topic) == Some(1)).await;

    hub.notify(&topic, ChangeKind::Insert);
    wait_until(|| snapshot_value(&reader, &topic) == Some(2)).await;

    hub.notify(&topic, ChangeKind::Delete);
    wait_until(|| snapshot_value(&reader, &topic) == Some(3)).await;

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_keeps_last_snapshot() {
    let hub = LocalChangeHub::new(16);
    let topic = TopicName::from("goal");
    let fetcher = GatedFetcher::new();
    fetcher.release(1);

    let mut engine = SyncEngine::new(SyncConfig::default(), hub.clone());
    engine.register_topic(topic.clone(), fetcher.clone()).unwrap();
    let controller = engine.start();
    let reader = controller.reader();

    wait_until(|| snapshot_value(&reader, &topic) == Some(1)).await;

    fetcher.set_failing(true);
    fetcher.release(1);
    hub.notify(&topic, ChangeKind::Update);

    wait_until(|| {
        matches!(
            reader.topic_status(&topic),
            Some(TopicStatus::FetchFailed(_))
        )
    })
    .await;

    let Some(TopicStatus::FetchFailed(error)) = reader.topic_status(&topic) else {
        panic!("expected failed status");
    };
    assert!(matches!(
        error.as_ref(),
        TopicProcessRecoverableError::FetchFailed(msg) if msg == "store unavailable"
    ));
    assert_eq!(snapshot_value(&reader, &topic), Some(1));

    // Recovers on the next notification
    fetcher.set_failing(false);
    fetcher.release(1);
    hub.notify(&topic, ChangeKind::Update);
    wait_until(|| snapshot_value(&reader, &topic) == Some(3)).await;

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_panicking_fetcher_is_reported_as_failure() {
    let hub = LocalChangeHub::new(16);
    let topic = TopicName::from("goal");

    let mut engine = SyncEngine::<usize>::new(SyncConfig::default(), hub.clone());
    engine
        .register_topic(
            topic.clone(),
            fetcher_fn(|| async {
                if true {
                    panic!("query builder exploded");
                }
                Ok::<usize, BoxError>(0)
            }),
        )
        .unwrap();
    let controller = engine.start();
    let reader = controller.reader();

    wait_until(|| {
        matches!(
            reader.topic_status(&topic),
            Some(TopicStatus::FetchFailed(_))
        )
    })
    .await;

    let Some(TopicStatus::FetchFailed(error)) = reader.topic_status(&topic) else {
        panic!("expected failed status");
    };
    assert!(matches!(
        error.as_ref(),
        TopicProcessRecoverableError::FetchPanicked(_)
    ));
    assert!(reader.snapshot(&topic).is_none());

    controller.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_topic_is_rejected() {
    let hub = LocalChangeHub::new(16);

    let mut engine = SyncEngine::new(SyncConfig::default(), hub);
    engine.register_topic("cards", GatedFetcher::new()).unwrap();

    let res = engine.register_topic("cards", GatedFetcher::new());
    assert!(matches!(res, Err(SyncError::DuplicateTopic(topic)) if topic.as_str() == "cards"));
    assert_eq!(engine.reader().topics().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hung_topic_does_not_block_others() {
    let hub = LocalChangeHub::new(16);
    let hung = GatedFetcher::new();
    let healthy = GatedFetcher::new();
    healthy.release(1);

    let mut engine = SyncEngine::new(SyncConfig::default(), hub.clone());
    engine.register_topic("pending", hung.clone()).unwrap();
    engine.register_topic("sales", healthy.clone()).unwrap();
    let controller = engine.start();
    let reader = controller.reader();

    let sales = TopicName::from("sales");
    wait_until(|| snapshot_value(&reader, &sales) == Some(1)).await;

    assert!(matches!(
        reader.topic_status(&TopicName::from("pending")),
        Some(TopicStatus::Fetching)
    ));
    assert_eq!(hung.calls(), 1);

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_closes_channels_and_discards_in_flight_result() {
    let hub = LocalChangeHub::new(16);
    let topic = TopicName::from("cards");
    let fetcher = GatedFetcher::new();

    let mut engine = SyncEngine::new(SyncConfig::default(), hub.clone());
    engine.register_topic(topic.clone(), fetcher.clone()).unwrap();
    let controller = engine.start();
    let reader = controller.reader();

    wait_until(|| fetcher.calls() == 1 && hub.subscriber_count(&topic) == 1).await;
    hub.notify(&topic, ChangeKind::Update);
    settle().await;

    controller.shutdown().await.unwrap();
    assert_eq!(hub.subscriber_count(&topic), 0);

    // The detached fetch completes, but nothing is committed
    fetcher.release(5);
    settle().await;
    time::sleep(time::Duration::from_secs(1)).await;

    assert!(reader.snapshot(&topic).is_none());
    assert_eq!(fetcher.calls(), 1);
    assert!(matches!(
        reader.topic_status(&topic),
        Some(TopicStatus::Stopped)
    ));

    assert!(matches!(
        controller.shutdown().await,
        Err(SyncError::SyncAlreadyShutdown)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_closed_channel_degrades_topic() {
    let hub = LocalChangeHub::new(16);
    let topic = TopicName::from("cards");
    let fetcher = GatedFetcher::new();
    fetcher.release(1);

    let mut engine = SyncEngine::new(SyncConfig::default(), hub.clone());
    engine.register_topic(topic.clone(), fetcher.clone()).unwrap();
    let controller = engine.start();
    let reader = controller.reader();

    wait_until(|| snapshot_value(&reader, &topic) == Some(1)).await;

    hub.close(&topic);

    wait_until(|| {
        matches!(
            reader.topic_status(&topic),
            Some(TopicStatus::Degraded(_))
        )
    })
    .await;

    let status = reader.topic_status(&topic).unwrap();
    assert!(status.is_stale());
    assert_eq!(snapshot_value(&reader, &topic), Some(1));

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_channel_still_loads_initial_snapshot() {
    let topic = TopicName::from("goal");
    let fetcher = GatedFetcher::new();
    fetcher.release(1);

    let mut engine = SyncEngine::new(SyncConfig::default(), Arc::new(UnavailableSource));
    engine.register_topic(topic.clone(), fetcher.clone()).unwrap();
    let controller = engine.start();
    let reader = controller.reader();

    wait_until(|| snapshot_value(&reader, &topic) == Some(1)).await;
    wait_until(|| {
        matches!(
            reader.topic_status(&topic),
            Some(TopicStatus::Degraded(_))
        )
    })
    .await;

    let Some(TopicStatus::Degraded(error)) = reader.topic_status(&topic) else {
        panic!("expected degraded status");
    };
    assert!(matches!(
        error.as_ref(),
        TopicProcessFatalError::SubscriptionOpenFailed(_)
    ));

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_initial_load_does_not_wait_for_channel_to_open() {
    let topic = TopicName::from("goal");
    let fetcher = GatedFetcher::new();
    fetcher.release(10);

    let mut engine = SyncEngine::new(SyncConfig::default(), Arc::new(HungSource));
    engine.register_topic(topic.clone(), fetcher.clone()).unwrap();
    let controller = engine.start();
    let reader = controller.reader();

    wait_until(|| snapshot_value(&reader, &topic) == Some(1)).await;
    assert!(matches!(
        reader.topic_status(&topic),
        Some(TopicStatus::Synced)
    ));

    time::sleep(time::Duration::from_secs(60)).await;
    assert_eq!(fetcher.calls(), 1);

    // A pending handshake doesn't hold up shutdown
    controller.shutdown().await.unwrap();
    assert!(matches!(
        reader.topic_status(&topic),
        Some(TopicStatus::Stopped)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_channel_opened_after_initial_load_triggers_refresh() {
    let topic = TopicName::from("goal");
    let fetcher = GatedFetcher::new();
    fetcher.release(10);

    let hub = LocalChangeHub::new(16);
    let gate = Arc::new(Semaphore::new(0));
    let source = Arc::new(DelayedSource {
        hub: hub.clone(),
        gate: gate.clone(),
    });

    let mut engine = SyncEngine::new(SyncConfig::default(), source);
    engine.register_topic(topic.clone(), fetcher.clone()).unwrap();
    let controller = engine.start();
    let reader = controller.reader();

    wait_until(|| snapshot_value(&reader, &topic) == Some(1)).await;

    gate.add_permits(1);
    wait_until(|| snapshot_value(&reader, &topic) == Some(2)).await;
    assert_eq!(hub.subscriber_count(&topic), 1);

    settle().await;
    assert_eq!(fetcher.calls(), 2);

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_update_receiver_publishes_snapshots() {
    let hub = LocalChangeHub::new(16);
    let fetcher = GatedFetcher::new();
    fetcher.release(1);

    let mut engine = SyncEngine::new(SyncConfig::default(), hub);
    engine.register_topic("goal", fetcher).unwrap();
    let mut update_rx = engine.update_receiver();
    let controller = engine.start();

    let snapshot = time::timeout(time::Duration::from_secs(5), async {
        loop {
            if let SyncUpdate::Snapshot(snapshot) = update_rx.recv().await.unwrap() {
                return snapshot;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(snapshot.topic().as_str(), "goal");
    assert_eq!(**snapshot.data(), 1);

    controller.shutdown().await.unwrap();
}

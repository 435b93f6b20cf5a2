use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use petadopt_core::dispatcher::{
    BatchReport, DispatcherConfig, DispatcherState, OutboxDispatcher,
};
use petadopt_core::messaging::EventPublisher;
use petadopt_core::outbox::OutboxRecord;
use petadopt_testing::{InMemoryBroker, InMemoryOutboxStore};

use crate::helpers::{EXCHANGE, adopted_record, broker, pet_name_of, registry};

type Dispatcher = OutboxDispatcher<InMemoryOutboxStore, InMemoryBroker>;

fn dispatcher(store: &InMemoryOutboxStore, broker: &InMemoryBroker) -> Dispatcher {
    dispatcher_with(store, broker, DispatcherConfig::default())
}

fn dispatcher_with(
    store: &InMemoryOutboxStore,
    broker: &InMemoryBroker,
    config: DispatcherConfig,
) -> Dispatcher {
    let publisher = EventPublisher::new(broker.clone(), EXCHANGE, registry());
    OutboxDispatcher::new(Arc::new(store.clone()), Arc::new(publisher), config)
}

/// Shutdown signal that never fires; `tick` only reads the current value.
fn running() -> watch::Receiver<bool> {
    watch::channel(false).1
}

fn find<'a>(records: &'a [OutboxRecord], seed: &OutboxRecord) -> &'a OutboxRecord {
    records.iter().find(|r| r.id == seed.id).unwrap()
}

#[tokio::test]
async fn should_not_block_the_batch_on_one_failing_publish() {
    let rex = adopted_record("Rex", 3);
    let bella = adopted_record("Bella", 2);
    let milo = adopted_record("Milo", 1);
    let store = InMemoryOutboxStore::with_records(vec![rex.clone(), bella.clone(), milo.clone()]);
    let broker = broker();
    broker.fail_publish_matching(|m| pet_name_of(&m.payload) == "Bella");

    let report = dispatcher(&store, &broker).tick(&running()).await.unwrap();

    assert_eq!(
        report,
        BatchReport {
            fetched: 3,
            published: 2,
            failed: 1,
            skipped: 0,
        }
    );
    let records = store.records();
    assert!(find(&records, &rex).is_processed);
    assert!(find(&records, &milo).is_processed);
    let failed = find(&records, &bella);
    assert!(!failed.is_processed);
    assert_eq!(failed.retry_count, 1);
    assert!(failed.last_error.as_deref().unwrap().contains("publish rejected"));

    let names: Vec<_> = broker
        .published()
        .iter()
        .map(|m| pet_name_of(&m.payload))
        .collect();
    assert_eq!(names, vec!["Rex", "Milo"]);
}

#[tokio::test]
async fn should_retry_failed_record_next_tick() {
    let rex = adopted_record("Rex", 0);
    let store = InMemoryOutboxStore::with_records(vec![rex.clone()]);
    let broker = broker();
    broker.fail_publish_matching(|_| true);
    let dispatcher = dispatcher(&store, &broker);

    dispatcher.tick(&running()).await.unwrap();
    broker.heal_publishes();
    let report = dispatcher.tick(&running()).await.unwrap();

    assert_eq!(report.published, 1);
    let record = store.get(rex.id).unwrap();
    assert!(record.is_processed);
    assert_eq!(record.retry_count, 1);
}

#[tokio::test]
async fn should_skip_records_at_the_retry_ceiling() {
    let mut tired = adopted_record("Rex", 1);
    tired.retry_count = 2;
    let fresh = adopted_record("Bella", 0);
    let store = InMemoryOutboxStore::with_records(vec![tired.clone(), fresh.clone()]);
    let broker = broker();
    let config = DispatcherConfig {
        max_retries: 2,
        ..DispatcherConfig::default()
    };

    let report = dispatcher_with(&store, &broker, config)
        .tick(&running())
        .await
        .unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.published, 1);
    let untouched = store.get(tired.id).unwrap();
    assert_eq!(untouched, tired);
}

#[tokio::test]
async fn should_send_unrecorded_publish_again() {
    let rex = adopted_record("Rex", 0);
    let store = InMemoryOutboxStore::with_records(vec![rex.clone()]);
    store.fail_mark_processed(true);
    let broker = broker();
    let dispatcher = dispatcher(&store, &broker);

    dispatcher.tick(&running()).await.unwrap();
    assert!(store.get(rex.id).unwrap().is_pending());

    store.fail_mark_processed(false);
    dispatcher.tick(&running()).await.unwrap();

    assert_eq!(broker.published().len(), 2);
    assert!(store.get(rex.id).unwrap().is_processed);
}

#[tokio::test]
async fn should_leave_the_batch_untouched_on_shutdown() {
    let store = InMemoryOutboxStore::with_records(vec![
        adopted_record("Rex", 1),
        adopted_record("Bella", 0),
    ]);
    let broker = broker();
    let (tx, rx) = watch::channel(true);

    let report = dispatcher(&store, &broker).tick(&rx).await.unwrap();

    assert_eq!(report.fetched, 2);
    assert_eq!(report.published, 0);
    assert!(broker.published().is_empty());
    assert!(store.records().iter().all(|r| r.is_pending()));
    drop(tx);
}

#[tokio::test]
async fn should_fail_the_tick_when_store_is_unreachable() {
    let store = InMemoryOutboxStore::new();
    store.set_unavailable(true);
    let dispatcher = dispatcher(&store, &broker());

    assert!(dispatcher.tick(&running()).await.is_err());
    assert_eq!(dispatcher.state(), DispatcherState::Idle);
}

#[tokio::test]
async fn should_survive_outage_and_stop_on_request() {
    let rex = adopted_record("Rex", 0);
    let store = InMemoryOutboxStore::with_records(vec![rex.clone()]);
    store.set_unavailable(true);
    let broker = broker();
    let config = DispatcherConfig {
        poll_interval: Duration::from_millis(10),
        ..DispatcherConfig::default()
    };
    let handle = dispatcher_with(&store, &broker, config).spawn();

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(broker.published().is_empty());
    store.set_unavailable(false);

    for _ in 0..100 {
        if store.get(rex.id).unwrap().is_processed {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(store.get(rex.id).unwrap().is_processed);

    handle.stop().await;
    assert_eq!(broker.published().len(), 1);
}

#[tokio::test]
async fn should_be_stopped_after_run_returns() {
    let store = InMemoryOutboxStore::new();
    let dispatcher = dispatcher(&store, &broker());
    let states = dispatcher.subscribe_state();
    let (tx, rx) = watch::channel(false);

    tx.send(true).unwrap();
    dispatcher.run(rx).await;

    assert_eq!(*states.borrow(), DispatcherState::Stopped);
}

use chrono::{DateTime, Utc};
use sea_orm::EntityTrait;
use uuid::Uuid;

use petadopt_core::outbox::db::DbOutboxStore;
use petadopt_core::outbox::entity as outbox_events;
use petadopt_core::outbox::{MAX_RETRY_COUNT, OutboxStore};

use crate::helpers::{adopted_record, outbox_db};

async fn store() -> DbOutboxStore {
    DbOutboxStore {
        db: outbox_db().await,
    }
}

// ── get_pending ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_pending_records_oldest_first() {
    let store = store().await;
    let newest = adopted_record("Rex", 1);
    let oldest = adopted_record("Bella", 30);
    let middle = adopted_record("Milo", 10);
    store
        .add_many(&[newest.clone(), oldest.clone(), middle.clone()])
        .await
        .unwrap();

    let pending = store.get_pending(10).await.unwrap();

    let ids: Vec<_> = pending.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![oldest.id, middle.id, newest.id]);
    assert_eq!(pending[0].event_data, oldest.event_data);
}

#[tokio::test]
async fn should_truncate_pending_to_batch_size() {
    let store = store().await;
    for minutes_ago in 0..5 {
        store
            .add(&adopted_record("Rex", minutes_ago))
            .await
            .unwrap();
    }

    assert_eq!(store.get_pending(3).await.unwrap().len(), 3);
}

#[tokio::test]
async fn should_skip_processed_and_exhausted_records() {
    let store = store().await;
    let processed = adopted_record("Rex", 3);
    let exhausted = adopted_record("Bella", 2);
    let waiting = adopted_record("Milo", 1);
    store
        .add_many(&[processed.clone(), exhausted.clone(), waiting.clone()])
        .await
        .unwrap();

    store.mark_processed(processed.id).await.unwrap();
    for _ in 0..MAX_RETRY_COUNT {
        store.mark_failed(exhausted.id, "broker down").await.unwrap();
    }

    let pending = store.get_pending(10).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, waiting.id);
    assert!(
        pending
            .iter()
            .all(|r| !r.is_processed && r.retry_count < MAX_RETRY_COUNT)
    );
}

#[tokio::test]
async fn should_ignore_add_many_without_records() {
    let store = store().await;
    store.add_many(&[]).await.unwrap();
    assert!(store.get_pending(10).await.unwrap().is_empty());
}

// ── mark_processed / mark_failed ─────────────────────────────────────────────

#[tokio::test]
async fn should_keep_first_timestamp_when_marked_processed_twice() {
    let store = store().await;
    let record = adopted_record("Rex", 0);
    store.add(&record).await.unwrap();

    store.mark_processed(record.id).await.unwrap();
    let first = processed_at(&store, record.id).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store.mark_processed(record.id).await.unwrap();
    let second = processed_at(&store, record.id).await;

    assert!(first.is_some());
    assert_eq!(first, second);
}

#[tokio::test]
async fn should_count_attempts_and_keep_last_error() {
    let store = store().await;
    let record = adopted_record("Rex", 0);
    store.add(&record).await.unwrap();

    store.mark_failed(record.id, "timeout").await.unwrap();
    store.mark_failed(record.id, "connection reset").await.unwrap();

    let pending = store.get_pending(10).await.unwrap();
    assert_eq!(pending[0].retry_count, 2);
    assert_eq!(pending[0].last_error.as_deref(), Some("connection reset"));
    assert!(!pending[0].is_processed);
    assert!(pending[0].processed_at.is_none());
}

#[tokio::test]
async fn should_leave_processed_record_alone_on_mark_failed() {
    let store = store().await;
    let record = adopted_record("Rex", 0);
    store.add(&record).await.unwrap();
    store.mark_processed(record.id).await.unwrap();

    store.mark_failed(record.id, "late failure").await.unwrap();

    let row = find_row(&store, record.id).await;
    assert!(row.is_processed);
    assert_eq!(row.retry_count, 0);
    assert!(row.last_error.is_none());
}

// ── find_exhausted ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_keep_exhausted_records_visible() {
    let store = store().await;
    let exhausted = adopted_record("Rex", 1);
    let healthy = adopted_record("Bella", 0);
    store
        .add_many(&[exhausted.clone(), healthy.clone()])
        .await
        .unwrap();
    for _ in 0..MAX_RETRY_COUNT {
        store.mark_failed(exhausted.id, "no route").await.unwrap();
    }

    let found = store.find_exhausted(10).await.unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, exhausted.id);
    assert_eq!(found[0].retry_count, MAX_RETRY_COUNT);
    assert_eq!(found[0].last_error.as_deref(), Some("no route"));
}

// ── helpers ──────────────────────────────────────────────────────────────────

async fn find_row(store: &DbOutboxStore, id: Uuid) -> outbox_events::Model {
    outbox_events::Entity::find_by_id(id)
        .one(&store.db)
        .await
        .unwrap()
        .expect("outbox row exists")
}

async fn processed_at(store: &DbOutboxStore, id: Uuid) -> Option<DateTime<Utc>> {
    find_row(store, id).await.processed_at
}

use std::future::Future;

use uuid::Uuid;

use crate::error::StoreError;
use crate::outbox::OutboxRecord;

/// Durable queue of outbox records.
///
/// Futures are `Send` so a dispatcher generic over the store can run on a
/// spawned task.
pub trait OutboxStore: Send + Sync {
    fn add(&self, record: &OutboxRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn add_many(
        &self,
        records: &[OutboxRecord],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Unprocessed records below the retry ceiling, oldest first, at most `batch_size`.
    fn get_pending(
        &self,
        batch_size: u64,
    ) -> impl Future<Output = Result<Vec<OutboxRecord>, StoreError>> + Send;

    /// Sets `is_processed` and `processed_at`. Idempotent.
    fn mark_processed(&self, id: Uuid) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Increments `retry_count` and stores `error` as `last_error`.
    fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Unprocessed records that reached the retry ceiling, oldest first.
    fn find_exhausted(
        &self,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<OutboxRecord>, StoreError>> + Send;
}

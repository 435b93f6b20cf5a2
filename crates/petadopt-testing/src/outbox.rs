use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use petadopt_core::error::StoreError;
use petadopt_core::outbox::{MAX_RETRY_COUNT, OutboxRecord, OutboxStore};

/// Outbox held in memory. Clones share the same records.
#[derive(Clone, Default)]
pub struct InMemoryOutboxStore {
    records: Arc<Mutex<Vec<OutboxRecord>>>,
    unavailable: Arc<AtomicBool>,
    fail_mark_processed: Arc<AtomicBool>,
}

impl InMemoryOutboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<OutboxRecord>) -> Self {
        let store = Self::default();
        *store.records.lock().unwrap() = records;
        store
    }

    /// Snapshot of every record, in insertion order.
    pub fn records(&self) -> Vec<OutboxRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<OutboxRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Make every operation fail with a storage error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make only `mark_processed` fail.
    pub fn fail_mark_processed(&self, fail: bool) {
        self.fail_mark_processed.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Storage(anyhow::anyhow!(
                "outbox store unavailable"
            )));
        }
        Ok(())
    }

    fn select(&self, limit: u64, exhausted: bool) -> Vec<OutboxRecord> {
        let mut selected: Vec<OutboxRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| !r.is_processed && (r.retry_count >= MAX_RETRY_COUNT) == exhausted)
            .cloned()
            .collect();
        selected.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        selected.truncate(limit as usize);
        selected
    }
}

impl OutboxStore for InMemoryOutboxStore {
    async fn add(&self, record: &OutboxRecord) -> Result<(), StoreError> {
        self.check_available()?;
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn add_many(&self, records: &[OutboxRecord]) -> Result<(), StoreError> {
        self.check_available()?;
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(())
    }

    async fn get_pending(&self, batch_size: u64) -> Result<Vec<OutboxRecord>, StoreError> {
        self.check_available()?;
        Ok(self.select(batch_size, false))
    }

    async fn mark_processed(&self, id: Uuid) -> Result<(), StoreError> {
        self.check_available()?;
        if self.fail_mark_processed.load(Ordering::SeqCst) {
            return Err(StoreError::Storage(anyhow::anyhow!(
                "mark_processed rejected"
            )));
        }
        if let Some(record) = self.records.lock().unwrap().iter_mut().find(|r| r.id == id) {
            record.mark_processed(Utc::now());
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), StoreError> {
        self.check_available()?;
        if let Some(record) = self.records.lock().unwrap().iter_mut().find(|r| r.id == id) {
            record.record_failure(error);
        }
        Ok(())
    }

    async fn find_exhausted(&self, limit: u64) -> Result<Vec<OutboxRecord>, StoreError> {
        self.check_available()?;
        Ok(self.select(limit, true))
    }
}

//! Background task draining the outbox into the broker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::StoreError;
use crate::messaging::{BrokerConnector, EventPublisher};
use crate::outbox::{MAX_RETRY_COUNT, OutboxRecord, OutboxStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Polling,
    Publishing,
    Recording,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub poll_interval: Duration,
    pub batch_size: u64,
    /// Records at or above this retry count are skipped.
    pub max_retries: i32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            batch_size: 100,
            max_retries: MAX_RETRY_COUNT,
        }
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub fetched: usize,
    pub published: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.fetched == 0
    }
}

enum Outcome {
    Published,
    Failed,
    Skipped,
}

pub struct OutboxDispatcher<S, C: BrokerConnector> {
    store: Arc<S>,
    publisher: Arc<EventPublisher<C>>,
    config: DispatcherConfig,
    state: watch::Sender<DispatcherState>,
}

impl<S, C> OutboxDispatcher<S, C>
where
    S: OutboxStore + 'static,
    C: BrokerConnector + 'static,
{
    pub fn new(
        store: Arc<S>,
        publisher: Arc<EventPublisher<C>>,
        config: DispatcherConfig,
    ) -> Self {
        let (state, _) = watch::channel(DispatcherState::Idle);
        Self {
            store,
            publisher,
            config,
            state,
        }
    }

    pub fn state(&self) -> DispatcherState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DispatcherState> {
        self.state.subscribe()
    }

    /// Process one batch. Stops early, leaving the remaining records
    /// untouched, once `shutdown` turns true.
    pub async fn tick(&self, shutdown: &watch::Receiver<bool>) -> Result<BatchReport, StoreError> {
        self.state.send_replace(DispatcherState::Polling);
        let batch = self.store.get_pending(self.config.batch_size).await;
        let batch = match batch {
            Ok(batch) => batch,
            Err(e) => {
                self.state.send_replace(DispatcherState::Idle);
                return Err(e);
            }
        };

        let mut report = BatchReport {
            fetched: batch.len(),
            ..BatchReport::default()
        };
        for (index, record) in batch.iter().enumerate() {
            if *shutdown.borrow() {
                tracing::info!(
                    remaining = batch.len() - index,
                    "shutdown requested, leaving rest of batch"
                );
                break;
            }
            match self.dispatch(record).await {
                Outcome::Published => report.published += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Skipped => report.skipped += 1,
            }
        }

        self.state.send_replace(DispatcherState::Idle);
        if !report.is_empty() {
            tracing::info!(
                fetched = report.fetched,
                published = report.published,
                failed = report.failed,
                skipped = report.skipped,
                "outbox batch dispatched"
            );
        }
        Ok(report)
    }

    async fn dispatch(&self, record: &OutboxRecord) -> Outcome {
        if record.retry_count >= self.config.max_retries {
            tracing::debug!(
                event_id = %record.id,
                retry_count = record.retry_count,
                "retry ceiling reached, skipping"
            );
            return Outcome::Skipped;
        }

        self.state.send_replace(DispatcherState::Publishing);
        let published = self
            .publisher
            .publish_raw(&record.event_type, &record.event_data)
            .await;

        self.state.send_replace(DispatcherState::Recording);
        match published {
            Ok(()) => {
                if let Err(e) = self.store.mark_processed(record.id).await {
                    // Left pending; it will be published again next tick.
                    tracing::error!(
                        event_id = %record.id,
                        event_type = %record.event_type,
                        error = %e,
                        "published but failed to mark processed"
                    );
                }
                Outcome::Published
            }
            Err(publish_err) => {
                tracing::warn!(
                    event_id = %record.id,
                    event_type = %record.event_type,
                    retry_count = record.retry_count + 1,
                    error = %publish_err,
                    "failed to publish outbox record"
                );
                if let Err(e) = self
                    .store
                    .mark_failed(record.id, &publish_err.to_string())
                    .await
                {
                    tracing::error!(
                        event_id = %record.id,
                        error = %e,
                        "failed to record publish failure"
                    );
                }
                Outcome::Failed
            }
        }
    }

    /// Poll every `poll_interval` until `shutdown` turns true (or its sender
    /// is dropped).
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            interval_ms = self.config.poll_interval.as_millis() as u64,
            batch_size = self.config.batch_size,
            "outbox dispatcher started"
        );
        loop {
            if *shutdown.borrow() {
                break;
            }
            if let Err(e) = self.tick(&shutdown).await {
                tracing::error!(error = %e, "outbox tick failed");
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        self.state.send_replace(DispatcherState::Stopped);
        tracing::info!("outbox dispatcher stopped");
    }

    pub fn spawn(self) -> DispatcherHandle {
        let (shutdown, rx) = watch::channel(false);
        let state = self.subscribe_state();
        let task = tokio::spawn(async move { self.run(rx).await });
        DispatcherHandle {
            shutdown,
            state,
            task,
        }
    }
}

/// Controls a dispatcher running on its own task.
pub struct DispatcherHandle {
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<DispatcherState>,
    task: JoinHandle<()>,
}

impl DispatcherHandle {
    pub fn state(&self) -> DispatcherState {
        *self.state.borrow()
    }

    /// Signal shutdown and wait for the current record to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "outbox dispatcher task panicked");
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainEvent;

/// Records whose retry count reached this ceiling are no longer dispatched.
pub const MAX_RETRY_COUNT: i32 = 5;

/// A serialized domain event waiting in the outbox.
///
/// Either unprocessed (`is_processed == false`, `processed_at == None`) or
/// terminally processed. Records are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxRecord {
    pub id: Uuid,
    pub event_type: String,
    /// JSON payload of the event.
    pub event_data: String,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub is_processed: bool,
    pub retry_count: i32,
    pub last_error: Option<String>,
}

impl OutboxRecord {
    pub fn new(event_type: impl Into<String>, event_data: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_type: event_type.into(),
            event_data: event_data.into(),
            created_at: Utc::now(),
            processed_at: None,
            is_processed: false,
            retry_count: 0,
            last_error: None,
        }
    }

    /// Serialize `event`; the record is timestamped with the event's occurrence time.
    pub fn from_event<E: DomainEvent + ?Sized>(event: &E) -> Result<Self, serde_json::Error> {
        let event_data = serde_json::to_string(event)?;
        Ok(Self {
            created_at: event.occurred_on(),
            ..Self::new(event.event_type(), event_data)
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.retry_count >= MAX_RETRY_COUNT
    }

    pub fn is_pending(&self) -> bool {
        !self.is_processed && !self.is_exhausted()
    }

    /// No-op when already processed, so the first timestamp wins.
    pub fn mark_processed(&mut self, at: DateTime<Utc>) {
        if self.is_processed {
            return;
        }
        self.is_processed = true;
        self.processed_at = Some(at);
    }

    pub fn record_failure(&mut self, error: impl Into<String>) {
        if self.is_processed {
            return;
        }
        self.retry_count += 1;
        self.last_error = Some(error.into());
    }
}

#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::StoreError;
use crate::outbox::OutboxRecord;

/// A domain event raised by an aggregate.
///
/// The serialized form of the event is the payload stored in the outbox and
/// published to the broker, so it should carry the aggregate id itself.
pub trait DomainEvent: Serialize + Send + Sync {
    /// Stable type tag, used to pick a routing key and a decoder.
    fn event_type(&self) -> &'static str;
    fn event_id(&self) -> Uuid;
    fn occurred_on(&self) -> DateTime<Utc>;
}

/// A consistency boundary persisted through an [`AggregateStore`].
pub trait Aggregate: Send + Sync {
    type Event: DomainEvent;

    fn id(&self) -> Uuid;

    /// Version the aggregate was loaded at (or last saved as).
    fn version(&self) -> i32;

    /// `true` until the aggregate has been inserted once.
    fn is_new(&self) -> bool;

    /// Events raised since the last successful save.
    fn pending_events(&self) -> &[Self::Event];

    /// Record a committed save: adopt `version`, drop pending events and stop
    /// being new. Stores call this only after the transaction committed.
    fn mark_committed(&mut self, version: i32);
}

/// Persists aggregates and their pending events in one atomic unit.
///
/// Implementations must insert new aggregates without a version check, replace
/// existing ones only when the stored version equals [`Aggregate::version`],
/// and write one outbox record per pending event inside the same transaction.
pub trait AggregateStore<A: Aggregate>: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<A>, StoreError>;

    /// Fails with [`StoreError::ConcurrencyConflict`] when the aggregate was
    /// modified since it was loaded. On any error the aggregate is untouched.
    async fn save(&self, aggregate: &mut A) -> Result<(), StoreError>;
}

/// Version the aggregate will be stored at once the pending save commits.
pub fn next_version<A: Aggregate>(aggregate: &A) -> i32 {
    if aggregate.is_new() {
        aggregate.version()
    } else {
        aggregate.version() + 1
    }
}

/// Serialize every pending event into an outbox record.
pub fn outbox_records_for<A: Aggregate>(aggregate: &A) -> Result<Vec<OutboxRecord>, StoreError> {
    aggregate
        .pending_events()
        .iter()
        .map(|event| OutboxRecord::from_event(event).map_err(StoreError::from))
        .collect()
}

//! Transactional outbox: durable queue of events waiting to be published.

pub mod db;
pub mod entity;
pub mod migration;
mod record;
mod store;

pub use record::{MAX_RETRY_COUNT, OutboxRecord};
pub use store::OutboxStore;

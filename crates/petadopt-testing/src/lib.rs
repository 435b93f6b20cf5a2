//! Test doubles for the pet adoption services.
//!
//! In-memory outbox store and broker, plus an in-memory sqlite database with
//! migrations applied. Use from `[dev-dependencies]` only.

pub mod broker;
pub mod db;
pub mod outbox;

pub use broker::{InMemoryBroker, InMemoryChannel};
pub use db::sqlite_db;
pub use outbox::InMemoryOutboxStore;

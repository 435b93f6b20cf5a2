//! Reliable event delivery shared by the pet adoption services.
//!
//! Aggregates are saved together with their pending domain events through an
//! [`AggregateStore`](domain::AggregateStore); the events land in the
//! `outbox_events` table inside the same transaction. An
//! [`OutboxDispatcher`](dispatcher::OutboxDispatcher) later drains that table
//! into the message broker.

pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod messaging;
pub mod outbox;
pub mod persistence;
pub mod tracing;
pub mod usecase;

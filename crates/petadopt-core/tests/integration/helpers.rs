use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;
use sea_orm_migration::{MigrationTrait, MigratorTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use petadopt_core::domain::DomainEvent;
use petadopt_core::messaging::{EventRegistry, ExchangeKind, ExchangeSpec};
use petadopt_core::outbox::OutboxRecord;
use petadopt_testing::InMemoryBroker;

pub const EXCHANGE: &str = "pet.events";

// ── Outbox-only migrator ─────────────────────────────────────────────────────

pub struct OutboxMigrator;

impl MigratorTrait for OutboxMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(petadopt_core::outbox::migration::Migration)]
    }
}

pub async fn outbox_db() -> DatabaseConnection {
    petadopt_testing::sqlite_db::<OutboxMigrator>().await
}

// ── Sample event ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetAdopted {
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub occurred_on: DateTime<Utc>,
    pub pet_name: String,
}

impl PetAdopted {
    pub fn new(pet_name: &str) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            aggregate_id: Uuid::now_v7(),
            occurred_on: Utc::now(),
            pet_name: pet_name.to_owned(),
        }
    }
}

impl DomainEvent for PetAdopted {
    fn event_type(&self) -> &'static str {
        "PetAdoptedEvent"
    }
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_on(&self) -> DateTime<Utc> {
        self.occurred_on
    }
}

pub fn registry() -> EventRegistry {
    EventRegistry::new().register::<PetAdopted>("PetAdoptedEvent", "pet.adopted.v1")
}

/// Broker with the events exchange already declared.
pub fn broker() -> InMemoryBroker {
    let broker = InMemoryBroker::new();
    broker.seed_exchange(ExchangeSpec::new(EXCHANGE, ExchangeKind::Topic));
    broker
}

/// Outbox record for a `PetAdopted` event created `minutes_ago`.
pub fn adopted_record(pet_name: &str, minutes_ago: i64) -> OutboxRecord {
    let event = PetAdopted {
        occurred_on: Utc::now() - Duration::minutes(minutes_ago),
        ..PetAdopted::new(pet_name)
    };
    OutboxRecord::from_event(&event).unwrap()
}

pub fn pet_name_of(payload: &[u8]) -> String {
    let value: serde_json::Value = serde_json::from_slice(payload).unwrap();
    value["petName"].as_str().unwrap().to_owned()
}

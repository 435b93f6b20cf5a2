use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use petadopt_core::domain::DomainEvent;

pub const PET_RESERVED: &str = "PetReservedEvent";
pub const PET_ADOPTED: &str = "PetAdoptedEvent";
pub const PET_RESERVATION_CANCELLED: &str = "PetReservationCancelledEvent";

/// Payload shared by every pet event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetEventData {
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub occurred_on: DateTime<Utc>,
    pub pet_name: String,
}

impl PetEventData {
    pub fn new(aggregate_id: Uuid, pet_name: &str, occurred_on: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            aggregate_id,
            occurred_on,
            pet_name: pet_name.to_owned(),
        }
    }
}

/// Events raised by [`Pet`](super::types::Pet). Serializes as the bare payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PetEvent {
    Reserved(PetEventData),
    Adopted(PetEventData),
    ReservationCancelled(PetEventData),
}

impl PetEvent {
    pub fn data(&self) -> &PetEventData {
        match self {
            Self::Reserved(data) | Self::Adopted(data) | Self::ReservationCancelled(data) => data,
        }
    }
}

impl DomainEvent for PetEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Reserved(_) => PET_RESERVED,
            Self::Adopted(_) => PET_ADOPTED,
            Self::ReservationCancelled(_) => PET_RESERVATION_CANCELLED,
        }
    }

    fn event_id(&self) -> Uuid {
        self.data().event_id
    }

    fn occurred_on(&self) -> DateTime<Utc> {
        self.data().occurred_on
    }
}

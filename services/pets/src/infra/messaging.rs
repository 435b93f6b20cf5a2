use petadopt_core::messaging::{EventRegistry, ExchangeKind, ExchangeSpec, QueueSpec, TopologySpec};

use crate::domain::events::{
    PET_ADOPTED, PET_RESERVATION_CANCELLED, PET_RESERVED, PetEventData,
};

pub const EVENTS_EXCHANGE: &str = "pet.events";
pub const DEAD_LETTER_EXCHANGE: &str = "pet.deadletter";

const ROUTES: [(&str, &str, &str); 3] = [
    (
        PET_RESERVED,
        "pet.reserved.v1",
        "pet.reserved.notifications",
    ),
    (PET_ADOPTED, "pet.adopted.v1", "pet.adopted.notifications"),
    (
        PET_RESERVATION_CANCELLED,
        "pet.reservation.cancelled.v1",
        "pet.reservation.cancelled.notifications",
    ),
];

/// Routing keys and decoders for every pet event.
pub fn pet_event_registry() -> EventRegistry {
    ROUTES
        .iter()
        .fold(EventRegistry::new(), |registry, &(tag, routing_key, _)| {
            registry.register::<PetEventData>(tag, routing_key)
        })
}

/// Built-in broker topology: one notification queue per event, each
/// dead-lettered to `pet.deadletter`.
pub fn pet_topology(exchange: &str) -> TopologySpec {
    TopologySpec {
        exchanges: vec![
            ExchangeSpec::new(exchange, ExchangeKind::Topic),
            ExchangeSpec::new(DEAD_LETTER_EXCHANGE, ExchangeKind::Fanout),
        ],
        queues: ROUTES
            .iter()
            .map(|&(_, routing_key, queue)| {
                QueueSpec::new(queue)
                    .dead_letter_to(DEAD_LETTER_EXCHANGE)
                    .bind(exchange, routing_key)
            })
            .collect(),
    }
}

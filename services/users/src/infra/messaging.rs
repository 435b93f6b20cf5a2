use petadopt_core::messaging::{EventRegistry, ExchangeKind, ExchangeSpec, QueueSpec, TopologySpec};

use crate::domain::events::{
    USER_PASSWORD_CHANGED, USER_PROFILE_UPDATED, USER_REGISTERED, USER_ROLE_CHANGED,
    USER_SUSPENDED, UserPasswordChanged, UserProfileUpdated, UserRegistered, UserRoleChanged,
    UserSuspended,
};

pub const EVENTS_EXCHANGE: &str = "user.events";
pub const DEAD_LETTER_EXCHANGE: &str = "user.deadletter";
pub const NOTIFICATIONS_QUEUE: &str = "user.notifications";

pub fn user_event_registry() -> EventRegistry {
    EventRegistry::new()
        .register::<UserRegistered>(USER_REGISTERED, "user.registered.v1")
        .register::<UserProfileUpdated>(USER_PROFILE_UPDATED, "user.profile-updated.v1")
        .register::<UserSuspended>(USER_SUSPENDED, "user.suspended.v1")
        .register::<UserPasswordChanged>(USER_PASSWORD_CHANGED, "user.password-changed.v1")
        .register::<UserRoleChanged>(USER_ROLE_CHANGED, "user.role-changed.v1")
}

/// One notification queue receiving every user event.
pub fn user_topology(exchange: &str) -> TopologySpec {
    TopologySpec {
        exchanges: vec![
            ExchangeSpec::new(exchange, ExchangeKind::Topic),
            ExchangeSpec::new(DEAD_LETTER_EXCHANGE, ExchangeKind::Fanout),
        ],
        queues: vec![
            QueueSpec::new(NOTIFICATIONS_QUEUE)
                .dead_letter_to(DEAD_LETTER_EXCHANGE)
                .bind(exchange, "user.#"),
        ],
    }
}

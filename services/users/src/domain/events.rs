use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use petadopt_core::domain::DomainEvent;

pub const USER_REGISTERED: &str = "UserRegisteredEvent";
pub const USER_PROFILE_UPDATED: &str = "UserProfileUpdatedEvent";
pub const USER_PASSWORD_CHANGED: &str = "UserPasswordChangedEvent";
pub const USER_ROLE_CHANGED: &str = "UserRoleChangedEvent";
pub const USER_SUSPENDED: &str = "UserSuspendedEvent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistered {
    pub event_id: Uuid,
    pub occurred_on: DateTime<Utc>,
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub registered_at: DateTime<Utc>,
}

/// Only the fields that changed are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileUpdated {
    pub event_id: Uuid,
    pub occurred_on: DateTime<Utc>,
    pub user_id: Uuid,
    pub new_full_name: Option<String>,
    pub new_phone_number: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPasswordChanged {
    pub event_id: Uuid,
    pub occurred_on: DateTime<Utc>,
    pub user_id: Uuid,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleChanged {
    pub event_id: Uuid,
    pub occurred_on: DateTime<Utc>,
    pub user_id: Uuid,
    pub new_role: String,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSuspended {
    pub event_id: Uuid,
    pub occurred_on: DateTime<Utc>,
    pub user_id: Uuid,
    pub reason: String,
    pub suspended_at: DateTime<Utc>,
}

/// Events raised by [`User`](super::types::User). Serializes as the bare payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UserEvent {
    Registered(UserRegistered),
    ProfileUpdated(UserProfileUpdated),
    PasswordChanged(UserPasswordChanged),
    RoleChanged(UserRoleChanged),
    Suspended(UserSuspended),
}

impl UserEvent {
    pub fn user_id(&self) -> Uuid {
        match self {
            Self::Registered(e) => e.user_id,
            Self::ProfileUpdated(e) => e.user_id,
            Self::PasswordChanged(e) => e.user_id,
            Self::RoleChanged(e) => e.user_id,
            Self::Suspended(e) => e.user_id,
        }
    }
}

impl DomainEvent for UserEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Registered(_) => USER_REGISTERED,
            Self::ProfileUpdated(_) => USER_PROFILE_UPDATED,
            Self::PasswordChanged(_) => USER_PASSWORD_CHANGED,
            Self::RoleChanged(_) => USER_ROLE_CHANGED,
            Self::Suspended(_) => USER_SUSPENDED,
        }
    }

    fn event_id(&self) -> Uuid {
        match self {
            Self::Registered(e) => e.event_id,
            Self::ProfileUpdated(e) => e.event_id,
            Self::PasswordChanged(e) => e.event_id,
            Self::RoleChanged(e) => e.event_id,
            Self::Suspended(e) => e.event_id,
        }
    }

    fn occurred_on(&self) -> DateTime<Utc> {
        match self {
            Self::Registered(e) => e.occurred_on,
            Self::ProfileUpdated(e) => e.occurred_on,
            Self::PasswordChanged(e) => e.occurred_on,
            Self::RoleChanged(e) => e.occurred_on,
            Self::Suspended(e) => e.occurred_on,
        }
    }
}

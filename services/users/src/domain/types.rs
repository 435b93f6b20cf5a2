use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use petadopt_core::domain::Aggregate;

use crate::domain::events::{
    UserEvent, UserPasswordChanged, UserProfileUpdated, UserRegistered, UserRoleChanged,
    UserSuspended,
};
use crate::error::UsersServiceError;

const MAX_EMAIL_LEN: usize = 255;
const FULL_NAME_LEN: std::ops::RangeInclusive<usize> = 2..=100;
const PHONE_LEN: std::ops::RangeInclusive<usize> = 10..=15;

// ── Value objects ────────────────────────────────────────────────────────────

/// Lowercased, trimmed email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, UsersServiceError> {
        let email = raw.trim().to_lowercase();
        if email.is_empty() {
            return Err(UsersServiceError::InvalidEmail("email is empty".into()));
        }
        if email.chars().count() > MAX_EMAIL_LEN {
            return Err(UsersServiceError::InvalidEmail(format!(
                "email is longer than {MAX_EMAIL_LEN} characters"
            )));
        }
        let Some((local, domain)) = email.split_once('@') else {
            return Err(UsersServiceError::InvalidEmail("missing `@`".into()));
        };
        let domain_ok =
            domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.');
        if local.is_empty() || !domain_ok {
            return Err(UsersServiceError::InvalidEmail(format!(
                "`{email}` is not an email address"
            )));
        }
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName(String);

impl FullName {
    pub fn parse(raw: &str) -> Result<Self, UsersServiceError> {
        let name = raw.trim();
        if !FULL_NAME_LEN.contains(&name.chars().count()) {
            return Err(UsersServiceError::InvalidFullName(format!(
                "must be between {} and {} characters",
                FULL_NAME_LEN.start(),
                FULL_NAME_LEN.end()
            )));
        }
        Ok(Self(name.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Phone number reduced to its digits and `+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, UsersServiceError> {
        let number: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        if !PHONE_LEN.contains(&number.len()) {
            return Err(UsersServiceError::InvalidPhoneNumber(format!(
                "must have between {} and {} digits",
                PHONE_LEN.start(),
                PHONE_LEN.end()
            )));
        }
        Ok(Self(number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(anyhow::anyhow!("unknown user role `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Suspended,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

impl FromStr for UserStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            other => Err(anyhow::anyhow!("unknown user status `{other}`")),
        }
    }
}

// ── User ─────────────────────────────────────────────────────────────────────

/// Adoption preferences a user keeps on their profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub preferred_pet_type: Option<String>,
    pub preferred_sizes: Vec<String>,
    pub preferred_age_range: Option<String>,
    pub receive_email_notifications: bool,
    pub receive_sms_notifications: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            preferred_pet_type: None,
            preferred_sizes: Vec::new(),
            preferred_age_range: None,
            receive_email_notifications: true,
            receive_sms_notifications: false,
        }
    }
}

/// Stored fields of a user, used to rebuild the aggregate.
#[derive(Debug, Clone)]
pub struct UserSnapshot {
    pub id: Uuid,
    pub email: Email,
    pub full_name: FullName,
    pub password_hash: String,
    pub role: UserRole,
    pub phone_number: Option<PhoneNumber>,
    pub preferences: UserPreferences,
    pub status: UserStatus,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub version: i32,
}

/// A registered account. `password_hash` is produced outside this service.
#[derive(Debug, Clone)]
pub struct User {
    state: UserSnapshot,
    is_new: bool,
    pending: Vec<UserEvent>,
}

impl User {
    pub fn register(
        email: Email,
        full_name: FullName,
        password_hash: String,
        phone_number: Option<PhoneNumber>,
    ) -> Self {
        let now = Utc::now();
        let id = Uuid::now_v7();
        let registered = UserEvent::Registered(UserRegistered {
            event_id: Uuid::now_v7(),
            occurred_on: now,
            user_id: id,
            email: email.as_str().to_owned(),
            full_name: full_name.as_str().to_owned(),
            role: UserRole::User.as_str().to_owned(),
            registered_at: now,
        });
        Self {
            state: UserSnapshot {
                id,
                email,
                full_name,
                password_hash,
                role: UserRole::User,
                phone_number,
                preferences: UserPreferences::default(),
                status: UserStatus::Active,
                registered_at: now,
                updated_at: now,
                last_login_at: None,
                version: 0,
            },
            is_new: true,
            pending: vec![registered],
        }
    }

    pub fn restore(snapshot: UserSnapshot) -> Self {
        Self {
            state: snapshot,
            is_new: false,
            pending: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> &UserSnapshot {
        &self.state
    }

    pub fn email(&self) -> &Email {
        &self.state.email
    }

    pub fn full_name(&self) -> &FullName {
        &self.state.full_name
    }

    pub fn password_hash(&self) -> &str {
        &self.state.password_hash
    }

    pub fn role(&self) -> UserRole {
        self.state.role
    }

    pub fn phone_number(&self) -> Option<&PhoneNumber> {
        self.state.phone_number.as_ref()
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.state.preferences
    }

    pub fn status(&self) -> UserStatus {
        self.state.status
    }

    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.state.last_login_at
    }

    /// Raises an event only when a field actually changes.
    pub fn update_profile(
        &mut self,
        full_name: Option<FullName>,
        phone_number: Option<PhoneNumber>,
        preferences: Option<UserPreferences>,
    ) -> Result<(), UsersServiceError> {
        self.ensure_active()?;
        let full_name = full_name.filter(|name| *name != self.state.full_name);
        let phone_number =
            phone_number.filter(|phone| self.state.phone_number.as_ref() != Some(phone));
        let preferences = preferences.filter(|prefs| *prefs != self.state.preferences);
        if full_name.is_none() && phone_number.is_none() && preferences.is_none() {
            return Ok(());
        }

        let now = self.touch();
        let event = UserProfileUpdated {
            event_id: Uuid::now_v7(),
            occurred_on: now,
            user_id: self.state.id,
            new_full_name: full_name.as_ref().map(|n| n.as_str().to_owned()),
            new_phone_number: phone_number.as_ref().map(|p| p.as_str().to_owned()),
            updated_at: now,
        };
        if let Some(name) = full_name {
            self.state.full_name = name;
        }
        if phone_number.is_some() {
            self.state.phone_number = phone_number;
        }
        if let Some(prefs) = preferences {
            self.state.preferences = prefs;
        }
        self.pending.push(UserEvent::ProfileUpdated(event));
        Ok(())
    }

    pub fn change_password(&mut self, password_hash: String) -> Result<(), UsersServiceError> {
        self.ensure_active()?;
        let now = self.touch();
        self.state.password_hash = password_hash;
        self.pending
            .push(UserEvent::PasswordChanged(UserPasswordChanged {
                event_id: Uuid::now_v7(),
                occurred_on: now,
                user_id: self.state.id,
                changed_at: now,
            }));
        Ok(())
    }

    pub fn promote_to_admin(&mut self) -> Result<(), UsersServiceError> {
        if self.state.role == UserRole::Admin {
            return Err(UsersServiceError::UserAlreadyAdmin);
        }
        let now = self.touch();
        self.state.role = UserRole::Admin;
        self.pending.push(UserEvent::RoleChanged(UserRoleChanged {
            event_id: Uuid::now_v7(),
            occurred_on: now,
            user_id: self.state.id,
            new_role: UserRole::Admin.as_str().to_owned(),
            changed_at: now,
        }));
        Ok(())
    }

    pub fn suspend(&mut self, reason: &str) -> Result<(), UsersServiceError> {
        if self.state.status == UserStatus::Suspended {
            return Err(UsersServiceError::UserAlreadySuspended);
        }
        let now = self.touch();
        self.state.status = UserStatus::Suspended;
        self.pending.push(UserEvent::Suspended(UserSuspended {
            event_id: Uuid::now_v7(),
            occurred_on: now,
            user_id: self.state.id,
            reason: reason.trim().to_owned(),
            suspended_at: now,
        }));
        Ok(())
    }

    pub fn activate(&mut self) -> Result<(), UsersServiceError> {
        if self.state.status == UserStatus::Active {
            return Err(UsersServiceError::UserAlreadyActive);
        }
        self.touch();
        self.state.status = UserStatus::Active;
        Ok(())
    }

    pub fn record_login(&mut self) {
        let now = self.touch();
        self.state.last_login_at = Some(now);
    }

    fn ensure_active(&self) -> Result<(), UsersServiceError> {
        match self.state.status {
            UserStatus::Active => Ok(()),
            UserStatus::Suspended => Err(UsersServiceError::UserSuspended),
        }
    }

    fn touch(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        self.state.updated_at = now;
        now
    }
}

impl Aggregate for User {
    type Event = UserEvent;

    fn id(&self) -> Uuid {
        self.state.id
    }

    fn version(&self) -> i32 {
        self.state.version
    }

    fn is_new(&self) -> bool {
        self.is_new
    }

    fn pending_events(&self) -> &[UserEvent] {
        &self.pending
    }

    fn mark_committed(&mut self, version: i32) {
        self.state.version = version;
        self.is_new = false;
        self.pending.clear();
    }
}

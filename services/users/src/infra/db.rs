use anyhow::Context as _;
use sea_orm::{ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use petadopt_core::domain::AggregateStore;
use petadopt_core::error::StoreError;
use petadopt_core::persistence::{VersionColumns, save_aggregate};
use petadopt_users_schema::users;

use crate::domain::repository::UserRepository;
use crate::domain::types::{Email, FullName, PhoneNumber, User, UserSnapshot};

// ── User store ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserStore {
    pub db: DatabaseConnection,
}

impl AggregateStore<User> for DbUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        model.map(user_from_model).transpose()
    }

    /// A second account with a taken email fails with [`StoreError::Duplicate`].
    async fn save(&self, user: &mut User) -> Result<(), StoreError> {
        save_aggregate::<users::Entity, _, _>(
            &self.db,
            user,
            VersionColumns {
                id: users::Column::Id,
                version: users::Column::Version,
            },
            active_model_from_user,
        )
        .await
    }
}

impl UserRepository for DbUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.db)
            .await
            .context("find user by email")?;
        model.map(user_from_model).transpose()
    }
}

fn active_model_from_user(user: &User, version: i32) -> users::ActiveModel {
    let s = user.snapshot();
    // Only strings and bools, so encoding never fails.
    let preferences = serde_json::to_string(&s.preferences).unwrap_or_default();
    users::ActiveModel {
        id: Set(s.id),
        email: Set(s.email.as_str().to_owned()),
        full_name: Set(s.full_name.as_str().to_owned()),
        password_hash: Set(s.password_hash.clone()),
        role: Set(s.role.as_str().to_owned()),
        phone_number: Set(s.phone_number.as_ref().map(|p| p.as_str().to_owned())),
        preferences: Set(preferences),
        status: Set(s.status.as_str().to_owned()),
        registered_at: Set(s.registered_at),
        updated_at: Set(s.updated_at),
        last_login_at: Set(s.last_login_at),
        version: Set(version),
    }
}

fn user_from_model(model: users::Model) -> Result<User, StoreError> {
    let invalid = |field: &str, e: crate::error::UsersServiceError| {
        anyhow::anyhow!("stored user {} has invalid {field}: {e}", model.id)
    };
    let email = Email::parse(&model.email).map_err(|e| invalid("email", e))?;
    let full_name = FullName::parse(&model.full_name).map_err(|e| invalid("full name", e))?;
    let phone_number = model
        .phone_number
        .as_deref()
        .map(PhoneNumber::parse)
        .transpose()
        .map_err(|e| invalid("phone number", e))?;
    let preferences = serde_json::from_str(&model.preferences)
        .with_context(|| format!("stored user {} has invalid preferences", model.id))?;
    Ok(User::restore(UserSnapshot {
        id: model.id,
        email,
        full_name,
        password_hash: model.password_hash,
        role: model.role.parse()?,
        phone_number,
        preferences,
        status: model.status.parse()?,
        registered_at: model.registered_at,
        updated_at: model.updated_at,
        last_login_at: model.last_login_at,
        version: model.version,
    }))
}

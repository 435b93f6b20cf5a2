use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use petadopt_core::domain::AggregateStore;
use petadopt_core::error::StoreError;
use petadopt_core::outbox::entity as outbox_events;
use petadopt_users::domain::repository::UserRepository;
use petadopt_users::domain::types::{Email, FullName, User};
use petadopt_users::infra::db::DbUserStore;
use petadopt_users::state::AppState;
use petadopt_users_migration::Migrator;

pub async fn users_db() -> DatabaseConnection {
    petadopt_testing::sqlite_db::<Migrator>().await
}

pub fn user_store(db: &DatabaseConnection) -> DbUserStore {
    DbUserStore { db: db.clone() }
}

pub fn app_state(db: &DatabaseConnection) -> AppState {
    AppState { db: db.clone() }
}

/// Outbox rows, oldest first.
pub async fn outbox_rows(db: &DatabaseConnection) -> Vec<outbox_events::Model> {
    let mut rows = outbox_events::Entity::find().all(db).await.unwrap();
    rows.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    rows
}

pub async fn registered_user(store: &DbUserStore, email: &str) -> User {
    let mut user = User::register(
        Email::parse(email).unwrap(),
        FullName::parse("Ana Lima").unwrap(),
        "$argon2id$hash".into(),
        None,
    );
    store.save(&mut user).await.unwrap();
    user
}

/// User store whose email lookup never sees existing accounts, like a
/// registration that checked just before a concurrent one committed.
pub struct StaleEmailLookup(pub DbUserStore);

impl AggregateStore<User> for StaleEmailLookup {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.0.find_by_id(id).await
    }

    async fn save(&self, user: &mut User) -> Result<(), StoreError> {
        self.0.save(user).await
    }
}

impl UserRepository for StaleEmailLookup {
    async fn find_by_email(&self, _email: &Email) -> Result<Option<User>, StoreError> {
        Ok(None)
    }
}

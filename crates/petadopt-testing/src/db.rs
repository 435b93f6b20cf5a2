use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

/// Fresh in-memory sqlite database with every migration of `M` applied.
///
/// The pool holds a single connection so every query sees the same database.
pub async fn sqlite_db<M: MigratorTrait>() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("connect to in-memory sqlite");
    M::up(&db, None).await.expect("apply migrations");
    db
}

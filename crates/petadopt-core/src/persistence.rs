//! Write path shared by the sea-orm aggregate stores.

use anyhow::Context as _;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityName, EntityTrait,
    IntoActiveModel, QueryFilter, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::{Aggregate, next_version, outbox_records_for};
use crate::error::StoreError;
use crate::outbox::db::insert_outbox_records;

/// Primary key and version columns of an aggregate table.
#[derive(Debug, Clone, Copy)]
pub struct VersionColumns<C> {
    pub id: C,
    pub version: C,
}

enum Write<M> {
    Insert(M),
    Update { model: M, expected: Condition },
}

/// Save `aggregate` and its pending events in one transaction.
///
/// New aggregates are inserted. Existing ones are replaced only while the
/// stored version still equals [`Aggregate::version`]; otherwise the whole
/// unit rolls back with [`StoreError::ConcurrencyConflict`]. An insert hitting
/// a unique key fails with [`StoreError::Duplicate`]. The aggregate is marked
/// committed only after the transaction commits.
pub async fn save_aggregate<E, A, F>(
    db: &DatabaseConnection,
    aggregate: &mut A,
    columns: VersionColumns<E::Column>,
    to_model: F,
) -> Result<(), StoreError>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send + 'static,
    A: Aggregate,
    F: FnOnce(&A, i32) -> E::ActiveModel,
{
    let records = outbox_records_for(aggregate)?;
    let version = next_version(aggregate);
    let id = aggregate.id();
    let expected_version = aggregate.version();
    let mut model = to_model(aggregate, version);
    let write = if aggregate.is_new() {
        Write::Insert(model)
    } else {
        model.not_set(columns.id);
        Write::Update {
            model,
            expected: Condition::all()
                .add(columns.id.eq(id))
                .add(columns.version.eq(expected_version)),
        }
    };

    db.transaction::<_, (), StoreError>(move |txn| {
        Box::pin(async move {
            match write {
                Write::Insert(model) => {
                    E::insert(model)
                        .exec_without_returning(txn)
                        .await
                        .map_err(|e| insert_failed(e, id))?;
                }
                Write::Update { model, expected } => {
                    let result = E::update_many()
                        .set(model)
                        .filter(expected)
                        .exec(txn)
                        .await
                        .context("update aggregate")?;
                    if result.rows_affected == 0 {
                        return Err(StoreError::ConcurrencyConflict {
                            aggregate_id: id,
                            expected_version,
                        });
                    }
                }
            }
            insert_outbox_records(txn, &records)
                .await
                .context("insert outbox records")?;
            Ok(())
        })
    })
    .await?;

    let entity = E::default();
    tracing::debug!(
        table = entity.table_name(),
        aggregate_id = %id,
        version,
        "aggregate saved"
    );
    aggregate.mark_committed(version);
    Ok(())
}

/// Map a unique-key violation to [`StoreError::Duplicate`].
pub fn insert_failed(err: DbErr, aggregate_id: Uuid) -> StoreError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return StoreError::Duplicate { aggregate_id };
    }
    StoreError::Storage(anyhow::Error::new(err).context("insert aggregate"))
}

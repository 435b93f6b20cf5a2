use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use uuid::Uuid;

use crate::error::StoreError;
use crate::outbox::entity as outbox_events;
use crate::outbox::{MAX_RETRY_COUNT, OutboxRecord, OutboxStore};

// ── Outbox store ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOutboxStore {
    pub db: DatabaseConnection,
}

impl OutboxStore for DbOutboxStore {
    async fn add(&self, record: &OutboxRecord) -> Result<(), StoreError> {
        insert_outbox_records(&self.db, std::slice::from_ref(record))
            .await
            .context("insert outbox record")?;
        Ok(())
    }

    async fn add_many(&self, records: &[OutboxRecord]) -> Result<(), StoreError> {
        insert_outbox_records(&self.db, records)
            .await
            .context("insert outbox records")?;
        Ok(())
    }

    async fn get_pending(&self, batch_size: u64) -> Result<Vec<OutboxRecord>, StoreError> {
        let models = outbox_events::Entity::find()
            .filter(outbox_events::Column::IsProcessed.eq(false))
            .filter(outbox_events::Column::RetryCount.lt(MAX_RETRY_COUNT))
            .order_by_asc(outbox_events::Column::CreatedAt)
            .order_by_asc(outbox_events::Column::Id)
            .limit(batch_size)
            .all(&self.db)
            .await
            .context("fetch pending outbox records")?;
        Ok(models.into_iter().map(record_from_model).collect())
    }

    async fn mark_processed(&self, id: Uuid) -> Result<(), StoreError> {
        // Guarded on is_processed so a second call keeps the original timestamp.
        outbox_events::Entity::update_many()
            .col_expr(outbox_events::Column::IsProcessed, Expr::value(true))
            .col_expr(outbox_events::Column::ProcessedAt, Expr::value(Utc::now()))
            .filter(outbox_events::Column::Id.eq(id))
            .filter(outbox_events::Column::IsProcessed.eq(false))
            .exec(&self.db)
            .await
            .context("mark outbox record processed")?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), StoreError> {
        outbox_events::Entity::update_many()
            .col_expr(
                outbox_events::Column::RetryCount,
                Expr::col(outbox_events::Column::RetryCount).add(1),
            )
            .col_expr(
                outbox_events::Column::LastError,
                Expr::value(error.to_owned()),
            )
            .filter(outbox_events::Column::Id.eq(id))
            .filter(outbox_events::Column::IsProcessed.eq(false))
            .exec(&self.db)
            .await
            .context("mark outbox record failed")?;
        Ok(())
    }

    async fn find_exhausted(&self, limit: u64) -> Result<Vec<OutboxRecord>, StoreError> {
        let models = outbox_events::Entity::find()
            .filter(outbox_events::Column::IsProcessed.eq(false))
            .filter(outbox_events::Column::RetryCount.gte(MAX_RETRY_COUNT))
            .order_by_asc(outbox_events::Column::CreatedAt)
            .order_by_asc(outbox_events::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .context("fetch exhausted outbox records")?;
        Ok(models.into_iter().map(record_from_model).collect())
    }
}

/// Insert `records` on `conn`, which is usually the transaction that also
/// writes the aggregate.
pub async fn insert_outbox_records<C>(conn: &C, records: &[OutboxRecord]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if records.is_empty() {
        return Ok(());
    }
    outbox_events::Entity::insert_many(records.iter().map(active_model_from_record))
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

fn active_model_from_record(record: &OutboxRecord) -> outbox_events::ActiveModel {
    outbox_events::ActiveModel {
        id: Set(record.id),
        event_type: Set(record.event_type.clone()),
        event_data: Set(record.event_data.clone()),
        created_at: Set(record.created_at),
        processed_at: Set(record.processed_at),
        is_processed: Set(record.is_processed),
        retry_count: Set(record.retry_count),
        last_error: Set(record.last_error.clone()),
    }
}

fn record_from_model(model: outbox_events::Model) -> OutboxRecord {
    OutboxRecord {
        id: model.id,
        event_type: model.event_type,
        event_data: model.event_data,
        created_at: model.created_at,
        processed_at: model.processed_at,
        is_processed: model.is_processed,
        retry_count: model.retry_count,
        last_error: model.last_error,
    }
}

use sea_orm::TransactionError;
use uuid::Uuid;

/// Errors raised while persisting aggregates or outbox records.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The stored version no longer matches the version the aggregate was loaded at.
    #[error("aggregate {aggregate_id} was modified concurrently (expected version {expected_version})")]
    ConcurrencyConflict {
        aggregate_id: Uuid,
        expected_version: i32,
    },
    /// Inserting the aggregate hit a unique key.
    #[error("aggregate {aggregate_id} collides with an existing row")]
    Duplicate { aggregate_id: Uuid },
    #[error("failed to serialize domain event: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

impl From<TransactionError<StoreError>> for StoreError {
    fn from(err: TransactionError<StoreError>) -> Self {
        match err {
            TransactionError::Connection(db) => {
                Self::Storage(anyhow::Error::new(db).context("database transaction"))
            }
            TransactionError::Transaction(inner) => inner,
        }
    }
}

/// Errors reported by a broker transport.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// The entity already exists with different properties (AMQP 406).
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("channel is closed")]
    ChannelClosed,
    #[error("broker unavailable: {0}")]
    Unavailable(String),
    #[error("broker transport error: {0:#}")]
    Transport(#[from] anyhow::Error),
}

/// Errors raised while publishing a single event.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("payload of `{event_type}` does not decode: {source}")]
    Decode {
        event_type: String,
        source: serde_json::Error,
    },
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("broker rejected publish: {0}")]
    Broker(#[from] BrokerError),
}

/// Errors raised while provisioning broker topology at startup.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("topology provisioning failed after {attempts} attempts: {source}")]
    Exhausted { attempts: u32, source: BrokerError },
    #[error("invalid topology definition: {0:#}")]
    Definition(#[from] anyhow::Error),
}

//! Declarative broker topology and its idempotent provisioning.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::error::{BrokerError, TopologyError};
use crate::messaging::{BrokerChannel, BrokerConnector};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    Direct,
    Fanout,
    #[default]
    Topic,
    Headers,
}

/// Value of an `x-*` argument on an exchange or queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

pub type Arguments = BTreeMap<String, ArgumentValue>;

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSpec {
    pub name: String,
    #[serde(default)]
    pub kind: ExchangeKind,
    #[serde(default = "yes")]
    pub durable: bool,
    #[serde(default)]
    pub auto_delete: bool,
    #[serde(default)]
    pub arguments: Arguments,
}

impl ExchangeSpec {
    /// Durable, non auto-delete exchange.
    pub fn new(name: impl Into<String>, kind: ExchangeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            durable: true,
            auto_delete: false,
            arguments: Arguments::new(),
        }
    }

    pub fn transient(mut self) -> Self {
        self.durable = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingSpec {
    pub exchange: String,
    #[serde(default)]
    pub routing_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSpec {
    pub name: String,
    #[serde(default = "yes")]
    pub durable: bool,
    #[serde(default)]
    pub exclusive: bool,
    #[serde(default)]
    pub auto_delete: bool,
    #[serde(default)]
    pub arguments: Arguments,
    #[serde(default)]
    pub bindings: Vec<BindingSpec>,
}

impl QueueSpec {
    /// Durable, shared queue without bindings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            durable: true,
            exclusive: false,
            auto_delete: false,
            arguments: Arguments::new(),
            bindings: Vec::new(),
        }
    }

    pub fn bind(mut self, exchange: impl Into<String>, routing_key: impl Into<String>) -> Self {
        self.bindings.push(BindingSpec {
            exchange: exchange.into(),
            routing_key: routing_key.into(),
        });
        self
    }

    /// Route rejected and expired messages to `exchange`.
    pub fn dead_letter_to(mut self, exchange: impl Into<String>) -> Self {
        self.arguments.insert(
            "x-dead-letter-exchange".to_owned(),
            ArgumentValue::Str(exchange.into()),
        );
        self
    }
}

/// Everything a service needs declared before it publishes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologySpec {
    #[serde(default)]
    pub exchanges: Vec<ExchangeSpec>,
    #[serde(default)]
    pub queues: Vec<QueueSpec>,
}

impl TopologySpec {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TopologyError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read topology file {}", path.display()))?;
        let spec = serde_json::from_str(&raw)
            .with_context(|| format!("parse topology file {}", path.display()))?;
        Ok(spec)
    }
}

/// Fixed-delay retry applied to the whole provisioning sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(2),
        }
    }
}

enum Declaration<'a> {
    Exchange(&'a ExchangeSpec),
    Queue(&'a QueueSpec),
}

impl Declaration<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Self::Exchange(_) => "exchange",
            Self::Queue(_) => "queue",
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Exchange(spec) => &spec.name,
            Self::Queue(spec) => &spec.name,
        }
    }

    async fn declare<Ch: BrokerChannel>(&self, channel: &Ch) -> Result<(), BrokerError> {
        match self {
            Self::Exchange(spec) => channel.declare_exchange(spec).await,
            Self::Queue(spec) => channel.declare_queue(spec).await,
        }
    }

    async fn delete<Ch: BrokerChannel>(&self, channel: &Ch) -> Result<(), BrokerError> {
        match self {
            Self::Exchange(spec) => channel.delete_exchange(&spec.name).await,
            Self::Queue(spec) => channel.delete_queue(&spec.name).await,
        }
    }
}

/// Declares a [`TopologySpec`] at startup, replacing entities whose existing
/// properties disagree with the declaration.
pub struct TopologyProvisioner<C> {
    connector: C,
    retry: RetryPolicy,
}

impl<C: BrokerConnector> TopologyProvisioner<C> {
    pub fn new(connector: C, retry: RetryPolicy) -> Self {
        Self { connector, retry }
    }

    pub async fn provision(&self, spec: &TopologySpec) -> Result<(), TopologyError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.provision_once(spec).await {
                Ok(()) => {
                    tracing::info!(
                        attempt,
                        exchanges = spec.exchanges.len(),
                        queues = spec.queues.len(),
                        "broker topology provisioned"
                    );
                    return Ok(());
                }
                Err(source) if attempt >= max_attempts => {
                    tracing::error!(attempt, error = %source, "giving up on broker topology");
                    return Err(TopologyError::Exhausted {
                        attempts: attempt,
                        source,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %e,
                        "broker topology provisioning failed, retrying"
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn provision_once(&self, spec: &TopologySpec) -> Result<(), BrokerError> {
        let mut channel = self.connector.open_channel().await?;

        for exchange in &spec.exchanges {
            self.ensure(&mut channel, Declaration::Exchange(exchange))
                .await?;
        }

        for queue in &spec.queues {
            self.ensure(&mut channel, Declaration::Queue(queue)).await?;
            for binding in &queue.bindings {
                channel.bind_queue(&queue.name, binding).await?;
                tracing::debug!(
                    queue = %queue.name,
                    exchange = %binding.exchange,
                    routing_key = %binding.routing_key,
                    "queue bound"
                );
            }
        }
        Ok(())
    }

    /// Declare `decl`; on a property mismatch delete and redeclare it on a
    /// fresh channel, which then replaces `channel`.
    async fn ensure(
        &self,
        channel: &mut C::Channel,
        decl: Declaration<'_>,
    ) -> Result<(), BrokerError> {
        match decl.declare(&*channel).await {
            Ok(()) => Ok(()),
            Err(BrokerError::PreconditionFailed(reason)) => {
                tracing::warn!(
                    kind = decl.kind(),
                    name = %decl.name(),
                    %reason,
                    "existing declaration differs, recreating"
                );
                *channel = self.connector.open_channel().await?;
                decl.delete(&*channel).await?;
                decl.declare(&*channel).await
            }
            Err(e) => Err(e),
        }
    }
}

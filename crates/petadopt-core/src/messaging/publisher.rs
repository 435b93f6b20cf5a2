use tokio::sync::Mutex;

use crate::domain::DomainEvent;
use crate::error::PublishError;
use crate::messaging::{BrokerChannel, BrokerConnector, EventRegistry, OutgoingMessage};

/// Publishes domain events to one exchange.
///
/// The broker channel is opened on first use and cached; a closed channel is
/// replaced on the next publish. Publishes on one publisher are serialized.
pub struct EventPublisher<C: BrokerConnector> {
    connector: C,
    exchange: String,
    registry: EventRegistry,
    channel: Mutex<Option<C::Channel>>,
}

impl<C: BrokerConnector> EventPublisher<C> {
    pub fn new(connector: C, exchange: impl Into<String>, registry: EventRegistry) -> Self {
        Self {
            connector,
            exchange: exchange.into(),
            registry,
            channel: Mutex::new(None),
        }
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub async fn publish<E: DomainEvent>(&self, event: &E) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(event)?;
        let message_id = event.event_id().to_string();
        self.send(event.event_type(), payload, Some(message_id))
            .await
    }

    /// Publish in order, stopping at the first failure. Events published
    /// before the failure stay published.
    pub async fn publish_all<E: DomainEvent>(&self, events: &[E]) -> Result<(), PublishError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }

    /// Publish a stored payload.
    ///
    /// Registered types are decoded and re-encoded canonically, so a payload
    /// that no longer matches its type fails here instead of downstream.
    /// Unregistered types are forwarded verbatim.
    pub async fn publish_raw(&self, event_type: &str, payload: &str) -> Result<(), PublishError> {
        let (body, message_id) = match self.registry.decode(event_type, payload) {
            Some(Ok(value)) => {
                let message_id = value
                    .get("eventId")
                    .and_then(|v| v.as_str())
                    .map(str::to_owned);
                (serde_json::to_vec(&value)?, message_id)
            }
            Some(Err(source)) => {
                return Err(PublishError::Decode {
                    event_type: event_type.to_owned(),
                    source,
                });
            }
            None => (payload.as_bytes().to_vec(), None),
        };
        self.send(event_type, body, message_id).await
    }

    async fn send(
        &self,
        event_type: &str,
        payload: Vec<u8>,
        message_id: Option<String>,
    ) -> Result<(), PublishError> {
        let routing_key = match self.registry.routing_key(event_type) {
            Some(key) => key,
            None => {
                tracing::warn!(
                    event_type = %event_type,
                    "no routing key registered, publishing with empty routing key"
                );
                ""
            }
        };
        let message = OutgoingMessage {
            exchange: self.exchange.clone(),
            routing_key: routing_key.to_owned(),
            payload,
            message_id,
        };

        let mut guard = self.channel.lock().await;
        let channel = match guard.take() {
            Some(channel) if channel.is_open() => channel,
            Some(_) => {
                tracing::info!(exchange = %self.exchange, "broker channel closed, reopening");
                self.connector.open_channel().await?
            }
            None => self.connector.open_channel().await?,
        };
        let result = channel.publish(&message).await;
        *guard = Some(channel);
        result?;

        tracing::debug!(
            event_type = %event_type,
            routing_key = %message.routing_key,
            exchange = %self.exchange,
            "event published"
        );
        Ok(())
    }
}

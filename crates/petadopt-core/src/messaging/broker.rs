use std::future::Future;

use crate::error::BrokerError;
use crate::messaging::topology::{BindingSpec, ExchangeSpec, QueueSpec};

/// A message ready to be handed to the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub exchange: String,
    pub routing_key: String,
    pub payload: Vec<u8>,
    pub message_id: Option<String>,
}

/// One logical channel on a broker connection.
///
/// After a [`BrokerError::PreconditionFailed`] the broker closes the channel;
/// every further call returns [`BrokerError::ChannelClosed`].
pub trait BrokerChannel: Send + Sync {
    fn is_open(&self) -> bool;

    fn declare_exchange(
        &self,
        spec: &ExchangeSpec,
    ) -> impl Future<Output = Result<(), BrokerError>> + Send;

    fn delete_exchange(&self, name: &str) -> impl Future<Output = Result<(), BrokerError>> + Send;

    fn declare_queue(&self, spec: &QueueSpec)
    -> impl Future<Output = Result<(), BrokerError>> + Send;

    fn delete_queue(&self, name: &str) -> impl Future<Output = Result<(), BrokerError>> + Send;

    fn bind_queue(
        &self,
        queue: &str,
        binding: &BindingSpec,
    ) -> impl Future<Output = Result<(), BrokerError>> + Send;

    /// Resolves once the broker accepted the message.
    fn publish(
        &self,
        message: &OutgoingMessage,
    ) -> impl Future<Output = Result<(), BrokerError>> + Send;
}

/// Opens channels, connecting (or reconnecting) as needed.
pub trait BrokerConnector: Send + Sync {
    type Channel: BrokerChannel + 'static;

    fn open_channel(&self) -> impl Future<Output = Result<Self::Channel, BrokerError>> + Send;
}

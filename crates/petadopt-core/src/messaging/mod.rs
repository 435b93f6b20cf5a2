//! Broker-facing side of the outbox: transport ports, the AMQP adapter, the
//! event registry, the publisher and topology provisioning.

pub mod amqp;
mod broker;
mod publisher;
mod registry;
pub mod topology;

pub use broker::{BrokerChannel, BrokerConnector, OutgoingMessage};
pub use publisher::EventPublisher;
pub use registry::EventRegistry;
pub use topology::{
    ArgumentValue, Arguments, BindingSpec, ExchangeKind, ExchangeSpec, QueueSpec, RetryPolicy,
    TopologyProvisioner, TopologySpec,
};

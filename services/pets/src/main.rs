use std::sync::Arc;

use sea_orm::Database;
use tracing::info;

use petadopt_core::config::{BrokerConfig, Config, OutboxConfig};
use petadopt_core::dispatcher::OutboxDispatcher;
use petadopt_core::messaging::amqp::AmqpConnector;
use petadopt_core::messaging::{EventPublisher, TopologyProvisioner, TopologySpec};
use petadopt_core::outbox::db::DbOutboxStore;
use petadopt_core::tracing::init_tracing;

use petadopt_pets::config::PetsConfig;
use petadopt_pets::infra::messaging::{pet_event_registry, pet_topology};

#[tokio::main]
async fn main() {
    init_tracing();

    let config = PetsConfig::from_env().expect("failed to load pets config");
    let broker_config = BrokerConfig::from_env().expect("failed to load broker config");
    let outbox_config = OutboxConfig::from_env().expect("failed to load outbox config");

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let topology = match &broker_config.topology_file {
        Some(path) => TopologySpec::from_json_file(path).expect("failed to load topology file"),
        None => pet_topology(&config.events_exchange),
    };
    TopologyProvisioner::new(
        AmqpConnector::new(&broker_config.rabbitmq_url),
        broker_config.retry_policy(),
    )
    .provision(&topology)
    .await
    .expect("failed to provision broker topology");

    let publisher = EventPublisher::new(
        AmqpConnector::new(&broker_config.rabbitmq_url),
        &config.events_exchange,
        pet_event_registry(),
    );
    let dispatcher = OutboxDispatcher::new(
        Arc::new(DbOutboxStore { db }),
        Arc::new(publisher),
        outbox_config.dispatcher_config(),
    )
    .spawn();

    info!(exchange = %config.events_exchange, "pets service ready");

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
    info!("shutting down pets service");
    dispatcher.stop().await;
}

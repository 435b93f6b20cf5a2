use std::sync::Arc;

use sea_orm::Database;
use tracing::info;

use petadopt_core::config::{BrokerConfig, Config, OutboxConfig};
use petadopt_core::dispatcher::OutboxDispatcher;
use petadopt_core::messaging::amqp::AmqpConnector;
use petadopt_core::messaging::{EventPublisher, TopologyProvisioner, TopologySpec};
use petadopt_core::outbox::db::DbOutboxStore;
use petadopt_core::outbox::OutboxStore;
use petadopt_core::tracing::init_tracing;

use petadopt_users::config::UsersConfig;
use petadopt_users::infra::messaging::{user_event_registry, user_topology};

#[tokio::main]
async fn main() {
    init_tracing();

    let config = UsersConfig::from_env().expect("failed to load users config");
    let broker_config = BrokerConfig::from_env().expect("failed to load broker config");
    let outbox_config = OutboxConfig::from_env().expect("failed to load outbox config");

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let topology = match &broker_config.topology_file {
        Some(path) => TopologySpec::from_json_file(path).expect("failed to load topology file"),
        None => user_topology(&config.events_exchange),
    };
    TopologyProvisioner::new(
        AmqpConnector::new(&broker_config.rabbitmq_url),
        broker_config.retry_policy(),
    )
    .provision(&topology)
    .await
    .expect("failed to provision broker topology");

    let store = Arc::new(DbOutboxStore { db });
    match store.find_exhausted(100).await {
        Ok(stuck) if !stuck.is_empty() => {
            tracing::warn!(count = stuck.len(), "outbox records exceeded the retry limit");
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "could not inspect exhausted outbox records"),
    }

    let publisher = EventPublisher::new(
        AmqpConnector::new(&broker_config.rabbitmq_url),
        &config.events_exchange,
        user_event_registry(),
    );
    let dispatcher =
        OutboxDispatcher::new(store, Arc::new(publisher), outbox_config.dispatcher_config())
            .spawn();
    info!(exchange = %config.events_exchange, "users service ready");

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
    info!("shutting down users service");
    dispatcher.stop().await;
}

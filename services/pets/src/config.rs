use serde::Deserialize;

use petadopt_core::config::Config;

/// Pets service configuration loaded from environment variables.
///
/// Broker and dispatcher settings are loaded separately through
/// [`BrokerConfig`](petadopt_core::config::BrokerConfig) and
/// [`OutboxConfig`](petadopt_core::config::OutboxConfig).
#[derive(Debug, Clone, Deserialize)]
pub struct PetsConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// Exchange events are published to. Env var: `EVENTS_EXCHANGE`.
    #[serde(default = "default_events_exchange")]
    pub events_exchange: String,
}

impl Config for PetsConfig {}

fn default_events_exchange() -> String {
    "pet.events".to_owned()
}

use serde::Deserialize;

use petadopt_core::config::Config;

/// Users service configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// Env var: `EVENTS_EXCHANGE`.
    #[serde(default = "default_events_exchange")]
    pub events_exchange: String,
}

impl Config for UsersConfig {}

fn default_events_exchange() -> String {
    "user.events".to_owned()
}

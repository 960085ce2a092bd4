//! Holds the `LedaDb` config and its defaults.

use serde::{Deserialize, Serialize};

/// The default connection string of the database.
pub const DEFAULT_CONN_STR: &str = "postgresql://localhost:5432/hyperleda";
/// The default maximum amount of connections in the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 2;

/// The [`LedaDb`](super::LedaDb) config.
#[must_use]
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostgresDbConfig {
    /// The connection string of the database.
    pub conn_str: String,
    /// The maximum amount of connections in the pool.
    pub max_connections: u32,
}

impl Default for PostgresDbConfig {
    fn default() -> Self {
        Self {
            conn_str: DEFAULT_CONN_STR.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

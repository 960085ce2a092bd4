//! Holds the admin API config and its defaults.

use serde::{Deserialize, Serialize};

/// The default base url of the admin API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// The [`AdminApiClient`](super::AdminApiClient) config.
#[must_use]
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdminApiConfig {
    /// The base url of the API.
    pub base_url: String,
    /// The bearer token used to authenticate admin calls.
    pub token: String,
}

impl Default for AdminApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: String::new(),
        }
    }
}

//! Client for the HyperLeda admin API.

pub mod config;
mod error;
pub mod models;

use self::models::SetCrossmatchResultsRequest;
pub use self::{config::AdminApiConfig, error::AdminApiError};

/// A client for the admin endpoints of the HyperLeda API.
#[derive(Clone, Debug)]
pub struct AdminApiClient {
    client: reqwest::Client,
    config: AdminApiConfig,
}

impl AdminApiClient {
    /// Constructs an [`AdminApiClient`] from its config.
    pub fn new(config: AdminApiConfig) -> Result<Self, AdminApiError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    /// Assigns crossmatch verdicts to records.
    ///
    /// The server treats the assignment of `(record_id -> status, pgc,
    /// triage)` as idempotent, so replaying a page yields the same end
    /// state.
    pub async fn set_crossmatch_results(&self, request: &SetCrossmatchResultsRequest) -> Result<(), AdminApiError> {
        let url = format!("{}/api/v1/admin/crossmatch", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.token)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdminApiError::UnexpectedStatus { status, body });
        }
        Ok(())
    }
}

use thiserror::Error;

/// The different errors that can happen while talking to the admin API.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum AdminApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },
}

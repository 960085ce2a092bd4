use thiserror::Error;

/// The different errors that can happen with database access.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum DbError {
    #[error("postgres error: {0}")]
    Postgres(#[from] sqlx::Error),
}

//! Holds the `LedaDb` handle and its config.

mod catalog;
pub mod config;
mod error;
mod records;

use sqlx::postgres::{PgPool, PgPoolOptions};

pub use self::{
    config::PostgresDbConfig,
    error::DbError,
    records::{CandidateRow, CrossmatchPage, PageRecord},
};

/// A handle to the underlying HyperLeda Postgres database.
#[derive(Clone, Debug)]
pub struct LedaDb {
    pub(crate) pool: PgPool,
}

impl LedaDb {
    /// Constructs a [`LedaDb`] by connecting to a Postgres instance.
    pub async fn connect(config: &PostgresDbConfig) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.conn_str)
            .await?;
        Ok(Self { pool })
    }

    /// A handle whose pool was never connected; every query on it fails.
    /// Lets tests exercise the pure parts of the pipeline.
    #[cfg(test)]
    pub(crate) fn disconnected() -> Self {
        let pool = PgPoolOptions::new()
            .connect_lazy(config::DEFAULT_CONN_STR)
            .expect("default connection string parses");
        Self { pool }
    }
}

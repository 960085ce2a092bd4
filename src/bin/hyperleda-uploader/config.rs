use hyperleda::{api::AdminApiConfig, db::PostgresDbConfig};

/// Configuration of the uploader.
#[derive(Clone, Default, Debug)]
pub struct UploaderConfig {
    pub postgres: PostgresDbConfig,
    pub api: AdminApiConfig,
}

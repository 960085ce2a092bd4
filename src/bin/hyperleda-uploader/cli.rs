use clap::{Args, Parser, Subcommand};
use hyperleda::{api::config as api, crossmatch, crossmatch::CrossmatchConfig, db::postgres::config as postgres};

use crate::config::UploaderConfig;

/// Batched crossmatch of raw catalog tables against the HyperLeda canonical catalog
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct ClArgs {
    /// Postgres arguments.
    #[command(flatten, next_help_heading = "Postgres")]
    pub postgres: PostgresDbArgs,
    /// Admin API arguments.
    #[command(flatten, next_help_heading = "Admin API")]
    pub api: AdminApiArgs,
    /// Subcommands.
    #[command(subcommand)]
    pub subcommand: Subcommands,
}

impl ClArgs {
    /// Assembles the application config from the parsed arguments.
    pub fn get_config(&self) -> UploaderConfig {
        UploaderConfig {
            postgres: (&self.postgres).into(),
            api: (&self.api).into(),
        }
    }
}

#[derive(Args, Debug)]
pub struct PostgresDbArgs {
    /// The Postgres connection string.
    #[arg(long, value_name = "CONN_STR", env = "DATABASE_URL", default_value = postgres::DEFAULT_CONN_STR)]
    pub postgres_conn_str: String,
    /// The maximum amount of connections in the pool.
    #[arg(long, value_name = "N", default_value_t = postgres::DEFAULT_MAX_CONNECTIONS)]
    pub postgres_max_connections: u32,
}

impl From<&PostgresDbArgs> for hyperleda::db::PostgresDbConfig {
    fn from(value: &PostgresDbArgs) -> Self {
        Self {
            conn_str: value.postgres_conn_str.clone(),
            max_connections: value.postgres_max_connections,
        }
    }
}

#[derive(Args, Debug)]
pub struct AdminApiArgs {
    /// The base url of the HyperLeda admin API.
    #[arg(long, value_name = "URL", env = "HYPERLEDA_API_URL", default_value = api::DEFAULT_BASE_URL)]
    pub api_url: String,
    /// The bearer token for admin API calls.
    #[arg(long, value_name = "TOKEN", env = "HYPERLEDA_API_TOKEN", default_value = "")]
    pub api_token: String,
}

impl From<&AdminApiArgs> for hyperleda::api::AdminApiConfig {
    fn from(value: &AdminApiArgs) -> Self {
        Self {
            base_url: value.api_url.clone(),
            token: value.api_token.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Subcommands {
    /// Cross-identify objects in a raw table against existing catalog entries.
    Crossmatch(CrossmatchArgs),
}

#[derive(Args, Debug)]
pub struct CrossmatchArgs {
    /// Layer 0 table name.
    #[arg(long, value_name = "NAME")]
    pub table_name: String,
    /// Rows per batch.
    #[arg(long, value_name = "N", default_value_t = crossmatch::DEFAULT_BATCH_SIZE)]
    pub batch_size: i64,
    /// Print each record id with pending triage status.
    #[arg(long)]
    pub print_pending: bool,
    /// Write crossmatch results to the API; default is to only print statistics.
    #[arg(long)]
    pub write: bool,
    /// Resolver variant.
    #[command(subcommand)]
    pub mode: CrossmatchMode,
}

impl CrossmatchArgs {
    /// The crossmatch settings shared by both resolver variants.
    pub fn crossmatch_config(&self) -> CrossmatchConfig {
        CrossmatchConfig {
            table_name: self.table_name.clone(),
            batch_size: self.batch_size,
            print_pending: self.print_pending,
            write: self.write,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CrossmatchMode {
    /// Cross-identify using a single search radius.
    Default {
        /// Search radius in arcseconds.
        #[arg(long, value_name = "ARCSEC")]
        radius: f64,
        /// Column in the raw data table containing the claimed PGC; if
        /// omitted, PGC matching is disabled.
        #[arg(long, value_name = "COLUMN")]
        pgc_column: Option<String>,
    },
    /// Cross-identify using inner and outer search radii.
    TwoRadii {
        /// Inner radius in arcseconds.
        #[arg(long, value_name = "ARCSEC")]
        r1: f64,
        /// Outer radius in arcseconds.
        #[arg(long, value_name = "ARCSEC")]
        r2: f64,
        /// Maximum redshift difference treated as the same object.
        #[arg(long, value_name = "TOL", default_value_t = crossmatch::DEFAULT_REDSHIFT_TOLERANCE)]
        redshift_tolerance: f64,
    },
}

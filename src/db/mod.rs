//! Read-only access to the HyperLeda store.

pub mod postgres;

pub use self::postgres::{CandidateRow, CrossmatchPage, DbError, LedaDb, PageRecord, PostgresDbConfig};

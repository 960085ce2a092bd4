use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] hyperleda::api::AdminApiError),
    #[error(transparent)]
    Config(#[from] hyperleda::crossmatch::ConfigError),
    #[error(transparent)]
    Crossmatch(#[from] hyperleda::crossmatch::CrossmatchError),
    #[error(transparent)]
    Db(#[from] hyperleda::db::DbError),
}

use thiserror::Error;

/// Errors raised while executing a query
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query returned no result")]
    NoResult,

    #[error("query returned {0} rows where at most one was expected")]
    NonUniqueResult(usize),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type QueryResult<T> = Result<T, QueryError>;

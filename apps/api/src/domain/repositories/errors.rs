use thiserror::Error;
use uuid::Uuid;

use crate::query::QueryError;

/// Errors returned by repository implementations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Invalid sort property: {0}")]
    InvalidSort(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Query failed: {0}")]
    Query(#[from] QueryError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    pub fn member_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: "Member",
            id,
        }
    }

    pub fn team_not_found(id: Uuid) -> Self {
        Self::NotFound { entity: "Team", id }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

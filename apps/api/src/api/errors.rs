use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::repositories::RepositoryError;

/// API error type with HTTP status code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { .. } => Self::not_found(error.to_string()),
            RepositoryError::InvalidSort(_) => Self::bad_request(error.to_string()),
            other => {
                tracing::error!(error = %other, "repository failure");
                Self::internal_server_error("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn repository_errors_map_to_status() {
        let not_found = ApiError::from(RepositoryError::member_not_found(Uuid::nil()));
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert!(not_found.message.contains("Member not found"));

        let bad_sort = ApiError::from(RepositoryError::InvalidSort("password".into()));
        assert_eq!(bad_sort.status, StatusCode::BAD_REQUEST);

        let invalid = ApiError::from(RepositoryError::InvalidData("broken row".into()));
        assert_eq!(invalid.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!invalid.message.contains("broken row"));
    }
}

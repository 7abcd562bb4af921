use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::db::StoreError;
use crate::models::ValidationError;

pub const INVALID_BODY: &str = "Invalid request body";
pub const INVALID_ID: &str = "Invalid ID format";
pub const TODO_NOT_FOUND: &str = "Todo not found";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(&'static str),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Not found")]
    NotFound,

    /// `context` is the only part shown to the client.
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl AppError {
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> AppError {
        move |source| AppError::Store { context, source }
    }

    /// Like [`AppError::store`], but the no-documents sentinel becomes 404.
    pub fn from_write(context: &'static str) -> impl FnOnce(StoreError) -> AppError {
        move |source| match source {
            StoreError::NoDocuments => AppError::NotFound,
            source => AppError::Store { context, source },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::BadRequest(msg) => msg.to_string(),
            AppError::Validation(e) => e.to_string(),
            AppError::NotFound => TODO_NOT_FOUND.to_string(),
            AppError::Store { context, source } => {
                error!(error = %source, "{}", context);
                context.to_string()
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_maps_to_not_found() {
        let err = AppError::from_write("Error updating todo")(StoreError::NoDocuments);
        assert!(matches!(err, AppError::NotFound));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_other_store_errors_are_internal() {
        let err = AppError::from_write("Error deleting todo")(StoreError::Database(
            sqlx::Error::PoolClosed,
        ));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::store("Error fetching todos")(StoreError::NoDocuments);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_is_bad_request() {
        let err = AppError::from(ValidationError::InvalidDate);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid date format. Use YYYY-MM-DD");
    }
}

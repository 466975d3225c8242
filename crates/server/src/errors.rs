use goldsql::GenerationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// A custom error type for the server application.
///
/// This enum encapsulates different kinds of errors that can occur within the server,
/// allowing them to be converted into appropriate HTTP responses.
pub enum AppError {
    /// Errors originating from the `goldsql` library.
    Generation(GenerationError),
    /// The request body was missing a required field.
    BadRequest(String),
    /// The caller exceeded their request quota.
    RateLimited,
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

/// Conversion from `GenerationError` to `AppError`.
impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        AppError::Generation(err)
    }
}

/// Conversion from `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::Generation(err) => match err {
                GenerationError::EmptyQuestion | GenerationError::UnsupportedDialect(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                GenerationError::Policy(violation) => {
                    warn!("Generated SQL rejected: {violation}");
                    (StatusCode::UNPROCESSABLE_ENTITY, violation.to_string())
                }
                GenerationError::Backend(_) => {
                    error!("GenerationError: {:?}", err);
                    (StatusCode::BAD_GATEWAY, err.to_string())
                }
                GenerationError::StorageConnection(_)
                | GenerationError::StorageOperationFailed(_) => {
                    error!("GenerationError: {:?}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to access the application database.".to_string(),
                    )
                }
                _ => {
                    error!("GenerationError: {:?}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Server is not configured correctly.".to_string(),
                    )
                }
            },
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests. Please wait a moment and try again.".to_string(),
            ),
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown identity or wrong verifier. Deliberately a single variant:
    /// callers must not be able to tell the two cases apart.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A credential record with the same identity token already exists.
    #[error("Identity already registered")]
    DuplicateIdentity,

    /// No valid session for the request.
    #[error("Unauthorized")]
    Unauthorized,

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// Envelope integrity check failed on decryption (client side).
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// A transient persistence failure (PostgreSQL pool or Redis).
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Too many attempts against one identity.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl From<tokio_postgres::Error> for AppError {
    fn from(e: tokio_postgres::Error) -> Self {
        AppError::StoreUnavailable(e.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for AppError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        AppError::StoreUnavailable(e.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::StoreUnavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidCredentials => {
                tracing::warn!("Login rejected");
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }

            AppError::DuplicateIdentity => {
                tracing::warn!("Provisioning collision");
                (StatusCode::CONFLICT, "Identity already registered".to_string())
            }

            AppError::Unauthorized => {
                tracing::debug!("No valid session");
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }

            AppError::AuthenticationFailed => {
                tracing::warn!("Envelope integrity check failed");
                (StatusCode::BAD_REQUEST, "Authentication failed".to_string())
            }

            AppError::StoreUnavailable(ref e) => {
                tracing::error!("Store unavailable: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                )
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Encryption(ref msg) => {
                tracing::error!("Encryption error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Encryption error".to_string())
            }

            AppError::RateLimited => {
                tracing::warn!("Rate limit exceeded");
                (StatusCode::TOO_MANY_REQUESTS, "Too many attempts".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, body).into_response()
    }
}

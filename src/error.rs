// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseError;
use crate::services::ServiceError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError(String),
    InvalidJson(String),
    DuplicateEmail(String),
    InvalidToken(String),
    TokenAlreadyUsed(String),
    InvalidPayload(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    CascadeFailed { step: String, message: String },
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_)
            | ApiError::ValidationError(_)
            | ApiError::InvalidJson(_)
            | ApiError::DuplicateEmail(_)
            | ApiError::InvalidToken(_)
            | ApiError::TokenAlreadyUsed(_)
            | ApiError::InvalidPayload(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::CascadeFailed { .. } | ApiError::InternalServerError(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::ValidationError(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::DuplicateEmail(msg)
            | ApiError::InvalidToken(msg)
            | ApiError::TokenAlreadyUsed(msg)
            | ApiError::InvalidPayload(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalServerError(msg) => msg,
            ApiError::CascadeFailed { message, .. } => message,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        });

        if let ApiError::CascadeFailed { step, .. } = self {
            body["step"] = json!(step);
        }

        body
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            ApiError::InvalidToken(_) => "INVALID_TOKEN",
            ApiError::TokenAlreadyUsed(_) => "TOKEN_ALREADY_USED",
            ApiError::InvalidPayload(_) => "INVALID_PAYLOAD",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::CascadeFailed { .. } => "CASCADE_FAILED",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        // Don't expose internal SQL errors to clients
        tracing::error!("Database error: {}", err);
        ApiError::internal_server_error("Database error occurred")
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(msg) => ApiError::ValidationError(msg),
            ServiceError::DuplicateEmail => ApiError::DuplicateEmail(err.to_string()),
            ServiceError::InvalidToken => ApiError::InvalidToken(err.to_string()),
            ServiceError::TokenAlreadyUsed => ApiError::TokenAlreadyUsed(err.to_string()),
            ServiceError::InvalidPayload(msg) => ApiError::InvalidPayload(msg),
            ServiceError::PatientNotFound => ApiError::NotFound(err.to_string()),
            ServiceError::CascadeFailed { step, source } => {
                tracing::error!("Cascade delete failed at {}: {}", step, source);
                ApiError::CascadeFailed {
                    step: step.to_string(),
                    message: format!("Error deleting {step}"),
                }
            }
            ServiceError::Misconfigured(msg) => {
                tracing::error!("Configuration error: {}", msg);
                ApiError::internal_server_error("Server misconfigured")
            }
            ServiceError::Persistence(e) => e.into(),
            ServiceError::Notification(e) => {
                tracing::error!("Notification error: {}", e);
                ApiError::internal_server_error("Failed to send email")
            }
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

impl From<axum::extract::rejection::QueryRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

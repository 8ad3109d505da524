//! Unified API error handling.
//!
//! Every failure leaves the API as a JSON body `{"code", "message", "details"?}`
//! with the status code of its [`ErrorCode`]. Storage and crypto failures are
//! logged and replaced by a generic message.

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::services::ServiceError;

/// Error codes for API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Client errors (4xx)
    ValidationError,
    DuplicateEmail,
    DuplicateKey,
    InvalidCredentials,
    Unauthenticated,
    Forbidden,
    NotFound,
    EmptyOrder,

    // Server errors (5xx)
    ServerError,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::DuplicateEmail
            | ErrorCode::DuplicateKey
            | ErrorCode::EmptyOrder => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidCredentials | ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::DuplicateEmail => "duplicate_email",
            ErrorCode::DuplicateKey => "duplicate_key",
            ErrorCode::InvalidCredentials => "invalid_credentials",
            ErrorCode::Unauthenticated => "unauthenticated",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::NotFound => "not_found",
            ErrorCode::EmptyOrder => "empty_order",
            ErrorCode::ServerError => "server_error",
        }
    }
}

/// JSON body of an error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Field-level validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
}

#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<HashMap<String, Vec<String>>>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_validation_errors(mut self, errors: HashMap<String, Vec<String>>) -> Self {
        self.details = Some(errors);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn status(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthenticated, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Generic 500; the cause is expected to be logged by the caller
    pub fn server_error() -> Self {
        Self::new(ErrorCode::ServerError, "Something went wrong, please try again")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.as_str().to_string(),
            message: self.message,
            details: self.details,
        };

        (self.code.status_code(), Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Validation { fields, .. } => {
                ApiError::new(ErrorCode::ValidationError, message).with_validation_errors(fields)
            }
            ServiceError::DuplicateEmail => ApiError::new(ErrorCode::DuplicateEmail, message),
            ServiceError::DuplicateKey { .. } => ApiError::new(ErrorCode::DuplicateKey, message),
            ServiceError::InvalidCredentials => {
                ApiError::new(ErrorCode::InvalidCredentials, message)
            }
            ServiceError::Unauthenticated(_) => ApiError::new(ErrorCode::Unauthenticated, message),
            ServiceError::Forbidden(_) => ApiError::new(ErrorCode::Forbidden, message),
            ServiceError::NotFound(_) => ApiError::new(ErrorCode::NotFound, message),
            ServiceError::EmptyOrder => ApiError::new(ErrorCode::EmptyOrder, message),
            ServiceError::Database(e) => e.into(),
            ServiceError::PasswordHash(_) | ServiceError::Token(_) => {
                tracing::error!("{}", message);
                ApiError::server_error()
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);

        match &err {
            sqlx::Error::RowNotFound => ApiError::not_found("Resource not found"),
            _ => ApiError::server_error(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

/// `axum::Json` with rejections reported as [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use rfp_firestore::FirestoreError;
use rfp_models::requests::validation_message;
use rfp_models::GuardError;

use crate::metrics;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Operation not allowed in the entity's current status.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Duplicate response. Reported as a 400 so clients treat it like any
    /// other rejected submission.
    #[error("{0}")]
    Conflict(String),

    #[error("Profile already exists: {0}")]
    ProfileExists(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_)
            | ApiError::InvalidState(_)
            | ApiError::Conflict(_)
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ProfileExists(_) => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) | ApiError::Firestore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code returned next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::InvalidState(_) => "invalid_state",
            ApiError::Conflict(_) => "already_submitted",
            ApiError::ProfileExists(_) => "profile_exists",
            ApiError::RateLimited => "rate_limited",
            ApiError::Internal(_) => "internal",
            ApiError::Validation(_) => "validation_failed",
            ApiError::Firestore(_) => "store_error",
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, ApiError::Internal(_) | ApiError::Firestore(_))
    }
}

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        metrics::record_guard_rejection(err.code());
        let msg = err.to_string();
        match err {
            GuardError::Unauthenticated => ApiError::Unauthorized(msg),
            GuardError::WrongRole { .. } | GuardError::NotOwner => ApiError::Forbidden(msg),
            GuardError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            GuardError::InvalidState { .. } => ApiError::InvalidState(msg),
            GuardError::Validation(_) | GuardError::DeadlinePassed => ApiError::Validation(msg),
            GuardError::AlreadySubmitted => ApiError::Conflict(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(validation_message(&errors))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(status = %status, error = %self, "Request failed");
        } else {
            debug!(status = %status, error = %self, "Request rejected");
        }

        // Don't expose internal error details in production
        let message = if self.is_internal()
            && std::env::var("ENVIRONMENT")
                .map(|e| e.eq_ignore_ascii_case("production"))
                .unwrap_or(false)
        {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: message,
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}

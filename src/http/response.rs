//! Error responses.
//!
//! Every failure leaving a handler is rendered as one JSON shape carrying the
//! correlation id of the request:
//!
//! ```text
//! { "timestamp", "status", "errorCode", "message", "correlationId" }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::observability::correlation;
use crate::observability::invocation::ErrorStatus;
use crate::users::UserError;

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error_code: String,
    pub message: String,
    pub correlation_id: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, error_code: &str, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            status: status.as_u16(),
            error_code: error_code.to_string(),
            message: message.into(),
            correlation_id: correlation::current_or_sentinel(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl UserError {
    pub fn error_code(&self) -> &'static str {
        match self {
            UserError::NotFoundById(_) | UserError::NotFoundByEmail(_) => "USER_NOT_FOUND",
            UserError::AlreadyExists(_) => "USER_ALREADY_EXISTS",
            UserError::Validation(_) => "METHOD_ARGUMENT_NOT_VALID",
            UserError::Password(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl ErrorStatus for UserError {
    fn status(&self) -> StatusCode {
        match self {
            UserError::NotFoundById(_) | UserError::NotFoundByEmail(_) => StatusCode::NOT_FOUND,
            UserError::AlreadyExists(_) => StatusCode::CONFLICT,
            UserError::Validation(_) => StatusCode::BAD_REQUEST,
            UserError::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Unexpected error");
            "An unexpected error occurred".to_string()
        } else {
            self.to_string()
        };
        ErrorResponse::new(status, self.error_code(), message).into_response()
    }
}

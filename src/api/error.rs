//! API error types and responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::errors::Error;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - the resource is not in a state that allows the request.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Card balance too low for the purchase.
    #[error("insufficient funds: current={current}, required={required}")]
    InsufficientFunds {
        /// Remaining card balance.
        current: f64,
        /// Purchase amount.
        required: f64,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::InsufficientFunds { current, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_funds",
                self.to_string(),
                Some(serde_json::json!({
                    "current": current,
                    "required": required
                })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Config { .. } | Error::Database(_) | Error::Io(_) => {
                Self::Internal(err.to_string())
            }
            Error::Validation { .. }
            | Error::InvalidAmount { .. }
            | Error::VendorNotApproved { .. } => Self::BadRequest(err.to_string()),
            Error::JobNotFound { .. }
            | Error::CardNotFound { .. }
            | Error::CustomerNotFound { .. }
            | Error::TransactionNotFound { .. }
            | Error::PaymentLinkNotFound => Self::NotFound(err.to_string()),
            Error::InsufficientFunds { current, required } => {
                Self::InsufficientFunds { current, required }
            }
            Error::InvalidTransition { .. }
            | Error::CardInactive { .. }
            | Error::PaymentLinkInactive { .. } => Self::Conflict(err.to_string()),
        }
    }
}

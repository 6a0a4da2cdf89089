use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use dresscode_auth::{AuthzError, PasswordError, TokenError};
use dresscode_core::DomainError;
use dresscode_infra::StoreError;
use dresscode_orders::OrderError;

/// Error returned by every service operation.
///
/// | variant | status | `error` code |
/// |---|---|---|
/// | `Validation` | 400 | `validation_error` |
/// | `DuplicateLine` | 400 | `duplicate_line` |
/// | `Unauthenticated` | 401 | `unauthenticated` |
/// | `Forbidden` | 403 | `forbidden` |
/// | `NotFound` | 404 | `not_found` |
/// | `Conflict` | 409 | `conflict` |
/// | `InsufficientStock` | 409 | `insufficient_stock` |
/// | `Internal` | 500 | `internal_error` |
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    DuplicateLine(String),

    #[error("authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("insufficient stock for one or more lines")]
    InsufficientStock,

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ServiceError::DuplicateLine(_) => (StatusCode::BAD_REQUEST, "duplicate_line"),
            ServiceError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            ServiceError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ServiceError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ServiceError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ServiceError::InsufficientStock => (StatusCode::CONFLICT, "insufficient_stock"),
            ServiceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            // Storage details stay in the logs.
            ServiceError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        json_error(status, code, message)
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                ServiceError::Validation(msg)
            }
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound,
            StoreError::InvalidReference(msg) => {
                tracing::debug!(%msg, "reference to a missing row");
                ServiceError::NotFound
            }
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::Constraint(msg) => ServiceError::Validation(msg),
            StoreError::Backend(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<OrderError> for ServiceError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(msg) => ServiceError::Validation(msg),
            dup @ OrderError::DuplicateLine { .. } => ServiceError::DuplicateLine(dup.to_string()),
            OrderError::InsufficientStock => ServiceError::InsufficientStock,
            OrderError::NotFound => ServiceError::NotFound,
            OrderError::Storage(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        ServiceError::Forbidden(err.to_string())
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Length => ServiceError::Validation(err.to_string()),
            PasswordError::Hash(msg) => ServiceError::Internal(msg),
        }
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encode(msg) => ServiceError::Internal(msg),
            TokenError::Malformed(_) | TokenError::Claims(_) => ServiceError::Unauthenticated,
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

//! Access-control error taxonomy.
//!
//! Every rejection the gate produces is an [`AccessError`]. Callers branch on
//! [`AccessError::code`] and surface [`AccessError::status`] without parsing messages.
//! Conversion into an HTTP response happens only at the axum boundary.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::observability::metrics;

/// Failure raised by a backing store (sessions, ledger).
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or answered with garbage.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Fixture file could not be read or written.
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    /// Fixture file could not be decoded.
    #[error("store decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Authorization, quota and input failures.
#[derive(Error, Debug)]
pub enum AccessError {
    /// No session, unknown or expired token, or disabled user.
    #[error("authentication required")]
    Unauthorized,

    /// Authenticated, but the role is not permitted.
    #[error("insufficient role")]
    Forbidden,

    /// Fixed window exhausted for this key.
    #[error("rate limit exceeded")]
    RateLimited {
        /// Time left until the window resets.
        retry_after: Duration,
    },

    /// Same-origin check failed.
    #[error("origin not allowed")]
    InvalidOrigin,

    /// Request body did not match the operation's schema.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Referenced record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Backing store failure. The detail is logged, never returned to the client.
    #[error("internal error")]
    Internal(#[from] StoreError),
}

impl AccessError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AccessError::Unauthorized => "UNAUTHORIZED",
            AccessError::Forbidden => "FORBIDDEN",
            AccessError::RateLimited { .. } => "RATE_LIMITED",
            AccessError::InvalidOrigin => "INVALID_ORIGIN",
            AccessError::InvalidInput(_) => "INVALID_INPUT",
            AccessError::NotFound(_) => "NOT_FOUND",
            AccessError::Internal(_) => "INTERNAL",
        }
    }

    /// Suggested transport status.
    pub fn status(&self) -> StatusCode {
        match self {
            AccessError::Unauthorized => StatusCode::UNAUTHORIZED,
            AccessError::Forbidden | AccessError::InvalidOrigin => StatusCode::FORBIDDEN,
            AccessError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AccessError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AccessError::NotFound(_) => StatusCode::NOT_FOUND,
            AccessError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Retry hint in whole seconds, rounded up. Only set for `RATE_LIMITED`.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            AccessError::RateLimited { retry_after } => {
                let secs = retry_after.as_secs();
                Some(if retry_after.subsec_nanos() > 0 { secs + 1 } else { secs })
            }
            _ => None,
        }
    }
}

/// JSON body returned for every rejection.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub status: u16,
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AccessError::Internal(ref source) = self {
            tracing::error!(error = %source, "Store failure while handling request");
        }
        metrics::record_access_denied(self.code());

        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
            status: status.as_u16(),
        };
        let retry_after = self.retry_after_secs();

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

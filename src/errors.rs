//! Error handling module
//!
//! Every failure in the service is an `ErrorObj` from uphone-errors; the
//! per-crate wrappers convert into [`MarketError`], which the HTTP layer
//! renders as a status code plus the public error view.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use std::fmt;
use tracing::{debug, error};
use uphone_auth::errors::AuthError;
use uphone_errors::prelude::*;
use uphone_storage::StorageError;
use uphone_tx::errors::TxError;

#[derive(Debug, Clone)]
pub struct MarketError {
    inner: ErrorObj,
}

impl MarketError {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            inner: ErrorBuilder::new(code).user_msg(message).build(),
        }
    }

    fn with_dev(code: ErrorCode, dev: &str) -> Self {
        Self {
            inner: ErrorBuilder::new(code).dev_msg(dev).build(),
        }
    }

    pub fn unauthenticated(detail: &str) -> Self {
        Self::with_dev(codes::AUTH_UNAUTHENTICATED, detail)
    }

    pub fn forbidden(detail: &str) -> Self {
        Self::with_dev(codes::AUTH_FORBIDDEN, detail)
    }

    /// Registration asked for a role that cannot be self-assigned.
    pub fn role_escalation() -> Self {
        Self::with_dev(codes::AUTH_ROLE_ESCALATION, "admin role requested at registration")
    }

    pub fn not_found(resource: &str) -> Self {
        Self {
            inner: ErrorBuilder::new(codes::STORAGE_NOT_FOUND)
                .user_msg(format!("{} not found", resource))
                .dev_msg(format!("{} does not exist", resource))
                .build(),
        }
    }

    pub fn invalid_input(message: &str) -> Self {
        Self {
            inner: ErrorBuilder::new(codes::INPUT_INVALID)
                .user_msg(message)
                .dev_msg(message)
                .build(),
        }
    }

    pub fn conflict(message: &str) -> Self {
        Self {
            inner: ErrorBuilder::new(codes::STATE_CONFLICT)
                .user_msg(message)
                .build(),
        }
    }

    pub fn transient(detail: &str) -> Self {
        Self::with_dev(codes::PROVIDER_UNAVAILABLE, detail)
    }

    pub fn internal(detail: &str) -> Self {
        Self::with_dev(codes::UNKNOWN_INTERNAL, detail)
    }

    pub fn code(&self) -> ErrorCode {
        self.inner.code
    }

    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    pub fn user_message(&self) -> &str {
        &self.inner.message_user
    }

    pub fn dev_message(&self) -> Option<&str> {
        self.inner.message_dev.as_deref()
    }

    pub fn http_status(&self) -> u16 {
        self.inner.http_status
    }

    pub fn is_retryable(&self) -> bool {
        self.inner.is_retryable()
    }

    pub fn as_obj(&self) -> &ErrorObj {
        &self.inner
    }
}

impl fmt::Display for MarketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dev_message() {
            Some(dev) => write!(f, "{}: {}", self.inner.code.0, dev),
            None => write!(f, "{}: {}", self.inner.code.0, self.inner.message_user),
        }
    }
}

impl std::error::Error for MarketError {}

impl From<ErrorObj> for MarketError {
    fn from(inner: ErrorObj) -> Self {
        Self { inner }
    }
}

impl From<AuthError> for MarketError {
    fn from(err: AuthError) -> Self {
        Self::from(err.into_inner())
    }
}

impl From<StorageError> for MarketError {
    fn from(err: StorageError) -> Self {
        Self::from(err.into_inner())
    }
}

impl From<TxError> for MarketError {
    fn from(err: TxError) -> Self {
        Self::from(err.into_inner())
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_input(&format!("invalid JSON: {}", err))
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.inner.status_code();
        if status.is_server_error() {
            error!(
                code = self.inner.code.0,
                kind = self.inner.kind.as_str(),
                error = ?self.inner.to_audit(),
                "request failed"
            );
        } else {
            debug!(code = self.inner.code.0, dev = ?self.inner.message_dev, "request rejected");
        }
        (status, Json(self.inner.to_public())).into_response()
    }
}

/// Result type using MarketError
pub type MarketResult<T> = Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = MarketError::forbidden("not the owner");
        assert_eq!(err.code(), codes::AUTH_FORBIDDEN);
        assert_eq!(err.http_status(), 403);
        assert_eq!(err.dev_message(), Some("not the owner"));
    }

    #[test]
    fn test_storage_errors_keep_their_kind() {
        let err: MarketError = StorageError::unavailable("socket closed").into();
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(err.is_retryable());
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_role_escalation_status() {
        assert_eq!(MarketError::role_escalation().http_status(), 406);
    }

    #[test]
    fn test_conflict_is_terminal() {
        let err = MarketError::conflict("listing already booked");
        assert_eq!(err.http_status(), 409);
        assert!(!err.is_retryable());
        assert_eq!(err.user_message(), "listing already booked");
    }
}

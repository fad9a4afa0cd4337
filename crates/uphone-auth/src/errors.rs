//! Credential and token failures. The constructors are free functions so
//! the guard and the authenticator can share them without a type prefix.

use thiserror::Error;
use uphone_errors::prelude::*;

#[derive(Debug, Error)]
#[error("auth failure {}: {}", .0.code.0, .0.message_dev.as_deref().unwrap_or(""))]
pub struct AuthError(pub ErrorObj);

impl AuthError {
    pub fn into_inner(self) -> ErrorObj {
        self.0
    }

    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }
}

fn auth_error(code: ErrorCode, detail: &str) -> AuthError {
    AuthError(ErrorBuilder::new(code).dev_msg(detail).build())
}

/// No credential, or one that fails verification.
pub fn unauthenticated(detail: &str) -> AuthError {
    auth_error(codes::AUTH_UNAUTHENTICATED, detail)
}

/// Valid credential that does not cover the action.
pub fn forbidden(detail: &str) -> AuthError {
    auth_error(codes::AUTH_FORBIDDEN, detail)
}

pub fn invalid_request(detail: &str) -> AuthError {
    auth_error(codes::INPUT_INVALID, detail)
}

/// Signing failed; the caller may retry.
pub fn provider_unavailable(detail: &str) -> AuthError {
    auth_error(codes::PROVIDER_UNAVAILABLE, detail)
}

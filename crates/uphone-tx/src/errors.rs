use thiserror::Error;
use uphone_errors::prelude::*;

/// Failure of a saga step or compensation.
#[derive(Debug, Error)]
#[error("saga step failed {}: {}", .0.code.0, .0.message_dev.as_deref().unwrap_or(""))]
pub struct TxError(pub ErrorObj);

impl TxError {
    fn with_code(code: ErrorCode, detail: &str) -> Self {
        TxError(ErrorBuilder::new(code).dev_msg(detail).build())
    }

    pub fn into_inner(self) -> ErrorObj {
        self.0
    }

    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }

    /// The document was not in the state the step expected.
    pub fn conflict(detail: &str) -> Self {
        Self::with_code(codes::STATE_CONFLICT, detail)
    }

    pub fn not_found(detail: &str) -> Self {
        Self::with_code(codes::STORAGE_NOT_FOUND, detail)
    }

    pub fn unavailable(detail: &str) -> Self {
        Self::with_code(codes::STORAGE_UNAVAILABLE, detail)
    }

    pub fn internal(detail: &str) -> Self {
        Self::with_code(codes::UNKNOWN_INTERNAL, detail)
    }
}

impl From<ErrorObj> for TxError {
    fn from(value: ErrorObj) -> Self {
        TxError(value)
    }
}

use thiserror::Error;
use uphone_errors::prelude::*;

/// Repository failure. Boxed so `Result<Document, StorageError>` stays small.
#[derive(Debug, Error)]
#[error("storage failure {}: {}", .0.code.0, .0.message_dev.as_deref().unwrap_or(""))]
pub struct StorageError(pub Box<ErrorObj>);

impl StorageError {
    fn with_code(code: ErrorCode, detail: &str) -> Self {
        StorageError(Box::new(ErrorBuilder::new(code).dev_msg(detail).build()))
    }

    pub fn into_inner(self) -> ErrorObj {
        *self.0
    }

    pub fn kind(&self) -> ErrorKind {
        self.0.kind
    }

    /// A lookup or delete addressed a document that is not there.
    pub fn not_found(detail: &str) -> Self {
        Self::with_code(codes::STORAGE_NOT_FOUND, detail)
    }

    /// Duplicate id on insert.
    pub fn conflict(detail: &str) -> Self {
        Self::with_code(codes::STATE_CONFLICT, detail)
    }

    pub fn unavailable(detail: &str) -> Self {
        Self::with_code(codes::STORAGE_UNAVAILABLE, detail)
    }

    /// A stored document no longer decodes into its entity type.
    pub fn internal(detail: &str) -> Self {
        Self::with_code(codes::UNKNOWN_INTERNAL, detail)
    }
}

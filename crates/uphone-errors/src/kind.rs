use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Missing or invalid credential.
    Unauthenticated,
    /// Authenticated but not entitled (ownership or role mismatch).
    Forbidden,
    /// Malformed payload or a request the service refuses to interpret.
    InvalidInput,
    NotFound,
    /// State-machine precondition violated.
    Conflict,
    /// Persistence or external gateway failure.
    Transient,
    Internal,
}

/// Whether a caller may retry the failed request. Nothing in the service
/// retries on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryClass {
    Transient,
    Permanent,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Transient => "transient",
            ErrorKind::Internal => "internal",
        }
    }

    pub const fn retry_class(self) -> RetryClass {
        match self {
            ErrorKind::Transient | ErrorKind::Internal => RetryClass::Transient,
            _ => RetryClass::Permanent,
        }
    }
}

impl RetryClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            RetryClass::Transient => "transient",
            RetryClass::Permanent => "permanent",
        }
    }
}

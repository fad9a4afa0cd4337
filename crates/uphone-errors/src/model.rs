use crate::{
    code::{spec_of, ErrorCode},
    kind::{ErrorKind, RetryClass},
};
use serde::{Deserialize, Serialize};

/// One step of context appended while an error travelled up, e.g. a saga
/// compensation that failed after the original error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CauseEntry {
    pub code: String,
    pub summary: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorObj {
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub message_user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_dev: Option<String>,
    pub http_status: u16,
    pub retryable: RetryClass,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<CauseEntry>,
}

impl ErrorObj {
    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable == RetryClass::Transient
    }

    #[cfg(feature = "http")]
    pub fn status_code(&self) -> http::StatusCode {
        http::StatusCode::from_u16(self.http_status)
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR)
    }
}

pub struct ErrorBuilder {
    code: ErrorCode,
    message_user: Option<String>,
    message_dev: Option<String>,
    causes: Vec<CauseEntry>,
}

impl ErrorBuilder {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message_user: None,
            message_dev: None,
            causes: Vec::new(),
        }
    }

    pub fn user_msg(mut self, message: impl Into<String>) -> Self {
        self.message_user = Some(message.into());
        self
    }

    pub fn dev_msg(mut self, message: impl Into<String>) -> Self {
        self.message_dev = Some(message.into());
        self
    }

    pub fn cause(mut self, code: ErrorCode, summary: impl Into<String>) -> Self {
        self.causes.push(CauseEntry {
            code: code.0.to_string(),
            summary: summary.into(),
        });
        self
    }

    /// Kind, status and retry class always come from the code table.
    pub fn build(self) -> ErrorObj {
        let spec = spec_of(self.code);
        ErrorObj {
            code: spec.code,
            kind: spec.kind,
            message_user: self
                .message_user
                .unwrap_or_else(|| spec.default_user_msg.to_string()),
            message_dev: self.message_dev,
            http_status: spec.http_status,
            retryable: spec.kind.retry_class(),
            causes: self.causes,
        }
    }
}

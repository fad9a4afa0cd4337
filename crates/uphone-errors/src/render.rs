use crate::model::{CauseEntry, ErrorObj};
use serde::Serialize;

/// Error body returned to clients: `{ "code", "message" }`.
#[derive(Debug, Serialize)]
pub struct PublicErrorView {
    pub code: &'static str,
    pub message: String,
}

/// Everything worth logging about a failure, including the developer
/// message that clients never see.
#[derive(Debug, Serialize)]
pub struct AuditErrorView<'a> {
    pub code: &'static str,
    pub kind: &'static str,
    pub http_status: u16,
    pub retryable: bool,
    pub message_dev: Option<&'a str>,
    pub causes: &'a [CauseEntry],
}

impl ErrorObj {
    pub fn to_public(&self) -> PublicErrorView {
        PublicErrorView {
            code: self.code.0,
            message: self.message_user.clone(),
        }
    }

    pub fn to_audit(&self) -> AuditErrorView<'_> {
        AuditErrorView {
            code: self.code.0,
            kind: self.kind.as_str(),
            http_status: self.http_status,
            retryable: self.is_retryable(),
            message_dev: self.message_dev.as_deref(),
            causes: &self.causes,
        }
    }
}

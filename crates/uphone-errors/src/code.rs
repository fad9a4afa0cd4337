use crate::kind::ErrorKind;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub &'static str);

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        REGISTRY
            .get(s.as_str())
            .map(|spec| spec.code)
            .ok_or_else(|| serde::de::Error::custom(format!("unregistered error code: {s}")))
    }
}

#[derive(Clone, Debug)]
pub struct CodeSpec {
    pub code: ErrorCode,
    pub kind: ErrorKind,
    pub http_status: u16,
    pub default_user_msg: &'static str,
}

pub mod codes {
    use super::ErrorCode;

    pub const AUTH_UNAUTHENTICATED: ErrorCode = ErrorCode("AUTH.UNAUTHENTICATED");
    pub const AUTH_FORBIDDEN: ErrorCode = ErrorCode("AUTH.FORBIDDEN");
    pub const AUTH_ROLE_ESCALATION: ErrorCode = ErrorCode("AUTH.ROLE_ESCALATION");
    pub const INPUT_INVALID: ErrorCode = ErrorCode("INPUT.INVALID");
    pub const STORAGE_NOT_FOUND: ErrorCode = ErrorCode("STORAGE.NOT_FOUND");
    pub const STATE_CONFLICT: ErrorCode = ErrorCode("STATE.CONFLICT");
    pub const STORAGE_UNAVAILABLE: ErrorCode = ErrorCode("STORAGE.UNAVAILABLE");
    pub const PROVIDER_UNAVAILABLE: ErrorCode = ErrorCode("PROVIDER.UNAVAILABLE");
    pub const UNKNOWN_INTERNAL: ErrorCode = ErrorCode("UNKNOWN.INTERNAL");
}

const fn spec(
    code: ErrorCode,
    kind: ErrorKind,
    http_status: u16,
    default_user_msg: &'static str,
) -> CodeSpec {
    CodeSpec {
        code,
        kind,
        http_status,
        default_user_msg,
    }
}

/// Every code the service can answer with. The last entry is the fallback
/// for codes that were never registered.
static TABLE: [CodeSpec; 9] = [
    spec(codes::AUTH_UNAUTHENTICATED, ErrorKind::Unauthenticated, 401, "Please sign in."),
    spec(codes::AUTH_FORBIDDEN, ErrorKind::Forbidden, 403, "You are not allowed to do that."),
    spec(
        codes::AUTH_ROLE_ESCALATION,
        ErrorKind::InvalidInput,
        406,
        "That role cannot be chosen at sign-up.",
    ),
    spec(codes::INPUT_INVALID, ErrorKind::InvalidInput, 400, "The request is invalid."),
    spec(codes::STORAGE_NOT_FOUND, ErrorKind::NotFound, 404, "Not found."),
    spec(
        codes::STATE_CONFLICT,
        ErrorKind::Conflict,
        409,
        "The item is no longer in a state that allows this.",
    ),
    spec(
        codes::STORAGE_UNAVAILABLE,
        ErrorKind::Transient,
        500,
        "Storage is unavailable, please retry.",
    ),
    spec(
        codes::PROVIDER_UNAVAILABLE,
        ErrorKind::Transient,
        500,
        "A partner service is unavailable, please retry.",
    ),
    spec(codes::UNKNOWN_INTERNAL, ErrorKind::Internal, 500, "Something went wrong."),
];

pub static REGISTRY: Lazy<HashMap<&'static str, CodeSpec>> = Lazy::new(|| {
    TABLE
        .iter()
        .map(|spec| (spec.code.0, spec.clone()))
        .collect()
});

pub fn spec_of(code: ErrorCode) -> &'static CodeSpec {
    REGISTRY
        .get(code.0)
        .unwrap_or(&TABLE[TABLE.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        assert_eq!(REGISTRY.len(), TABLE.len());
    }

    #[test]
    fn unknown_codes_fall_back_to_internal() {
        assert_eq!(spec_of(ErrorCode("NOPE")).code, codes::UNKNOWN_INTERNAL);
    }
}

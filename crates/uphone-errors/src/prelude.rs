pub use crate::{
    code::{codes, spec_of, CodeSpec, ErrorCode, REGISTRY},
    kind::{ErrorKind, RetryClass},
    model::{CauseEntry, ErrorBuilder, ErrorObj},
    render::{AuditErrorView, PublicErrorView},
};

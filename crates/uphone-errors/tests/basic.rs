use uphone_errors::prelude::*;

#[test]
fn public_view_carries_code_and_user_message() {
    let err = ErrorBuilder::new(codes::AUTH_UNAUTHENTICATED)
        .dev_msg("missing bearer token")
        .build();

    let public = serde_json::to_value(err.to_public()).unwrap();
    assert_eq!(public["code"], "AUTH.UNAUTHENTICATED");
    assert_eq!(public["message"], "Please sign in.");
    assert!(public.get("message_dev").is_none());
    assert_eq!(public.as_object().unwrap().len(), 2);
}

#[test]
fn status_contract_per_code() {
    let cases = [
        (codes::AUTH_UNAUTHENTICATED, 401, ErrorKind::Unauthenticated),
        (codes::AUTH_FORBIDDEN, 403, ErrorKind::Forbidden),
        (codes::AUTH_ROLE_ESCALATION, 406, ErrorKind::InvalidInput),
        (codes::INPUT_INVALID, 400, ErrorKind::InvalidInput),
        (codes::STORAGE_NOT_FOUND, 404, ErrorKind::NotFound),
        (codes::STATE_CONFLICT, 409, ErrorKind::Conflict),
        (codes::STORAGE_UNAVAILABLE, 500, ErrorKind::Transient),
        (codes::PROVIDER_UNAVAILABLE, 500, ErrorKind::Transient),
        (codes::UNKNOWN_INTERNAL, 500, ErrorKind::Internal),
    ];
    for (code, status, kind) in cases {
        let err = ErrorBuilder::new(code).build();
        assert_eq!(err.http_status, status, "{}", code.0);
        assert_eq!(err.kind, kind, "{}", code.0);
    }
}

#[test]
fn only_transient_failures_are_retryable() {
    assert!(!ErrorBuilder::new(codes::STATE_CONFLICT).build().is_retryable());
    assert!(!ErrorBuilder::new(codes::AUTH_FORBIDDEN).build().is_retryable());
    assert!(ErrorBuilder::new(codes::STORAGE_UNAVAILABLE).build().is_retryable());
}

#[test]
fn audit_view_keeps_dev_message_and_causes() {
    let err = ErrorBuilder::new(codes::STORAGE_UNAVAILABLE)
        .dev_msg("connection refused")
        .cause(codes::STATE_CONFLICT, "compensation of reserve_listing failed")
        .build();
    let audit = err.to_audit();
    assert_eq!(audit.message_dev, Some("connection refused"));
    assert_eq!(audit.causes.len(), 1);
    assert!(audit.retryable);
}

#[test]
fn codes_round_trip_through_the_registry() {
    let err = ErrorBuilder::new(codes::STATE_CONFLICT).build();
    let json = serde_json::to_string(&err).unwrap();
    let back: ErrorObj = serde_json::from_str(&json).unwrap();
    assert_eq!(back.code, codes::STATE_CONFLICT);

    let unknown = serde_json::from_str::<ErrorCode>("\"NOT.A.CODE\"");
    assert!(unknown.is_err());
}

#[cfg(feature = "http")]
#[test]
fn http_status_mapping() {
    let err = ErrorBuilder::new(codes::STATE_CONFLICT).build();
    assert_eq!(err.status_code().as_u16(), 409);
}

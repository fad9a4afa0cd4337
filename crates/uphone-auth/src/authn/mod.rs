use crate::errors::{self, AuthError};
use crate::model::{AuthnInput, VerifiedPrincipal};
use async_trait::async_trait;

pub mod jwt;

/// Turns an inbound credential into a verified principal.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, input: AuthnInput) -> Result<VerifiedPrincipal, AuthError>;
}

/// Mints credentials the matching [`Authenticator`] accepts.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, principal_id: &str, email: Option<&str>) -> Result<String, AuthError>;
}

/// Parses an `Authorization` header value of the form `Bearer <token>`.
pub fn parse_bearer(header: &str) -> Result<AuthnInput, AuthError> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| errors::unauthenticated("malformed authorization header"))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(errors::unauthenticated("unsupported authorization scheme"));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(errors::unauthenticated("empty bearer token"));
    }
    Ok(AuthnInput::BearerJwt(token.to_string()))
}

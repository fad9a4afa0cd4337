pub use crate::authn::{jwt::JwtAuthenticator, parse_bearer, Authenticator, TokenIssuer};
pub use crate::errors::AuthError;
pub use crate::guard::{authorize, enforce};
pub use crate::model::{
    Action, Actor, AuthnInput, Decision, DenyReason, Ownership, Requirement, Resource,
    VerifiedPrincipal,
};

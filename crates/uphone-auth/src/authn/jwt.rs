use super::{Authenticator, TokenIssuer};
use crate::errors::{self, AuthError};
use crate::model::{AuthnInput, VerifiedPrincipal};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uphone_types::prelude::Id;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    iat: i64,
    exp: i64,
}

/// HS256 bearer tokens signed with a shared secret.
pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl JwtAuthenticator {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs: ttl_secs.min(i64::MAX as u64) as i64,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 5;
        validation
    }
}

#[async_trait::async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, input: AuthnInput) -> Result<VerifiedPrincipal, AuthError> {
        let AuthnInput::BearerJwt(token) = input;
        let data = decode::<Claims>(&token, &self.decoding, &Self::validation()).map_err(|err| {
            debug!(?err, "bearer token rejected");
            errors::unauthenticated(&format!("token verification failed: {err}"))
        })?;
        if data.claims.sub.trim().is_empty() {
            return Err(errors::unauthenticated("token has no subject"));
        }

        let mut claims = serde_json::Map::new();
        if let Some(email) = data.claims.email {
            claims.insert("email".into(), serde_json::Value::String(email));
        }
        Ok(VerifiedPrincipal {
            principal_id: Id(data.claims.sub),
            claims,
        })
    }
}

impl TokenIssuer for JwtAuthenticator {
    fn issue(&self, principal_id: &str, email: Option<&str>) -> Result<String, AuthError> {
        if principal_id.trim().is_empty() {
            return Err(errors::invalid_request("principal id must not be empty"));
        }
        let iat = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: principal_id.to_string(),
            email: email.map(str::to_string),
            iat,
            exp: iat.saturating_add(self.ttl_secs),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| errors::provider_unavailable(&format!("token signing failed: {err}")))
    }
}

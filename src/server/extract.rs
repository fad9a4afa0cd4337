//! Request extractors. Every rejection is a [`MarketError`], so malformed
//! requests get the same error body as service failures.

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{header, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;
use uphone_auth::prelude::*;

use super::state::ServeState;
use crate::errors::MarketError;

/// The caller behind the request, if it presented a bearer token.
///
/// No `Authorization` header means an anonymous caller; a header that does
/// not verify, or a principal missing from the directory, rejects the request.
#[derive(Clone, Debug)]
pub struct Caller(pub Option<Actor>);

impl Caller {
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

#[axum::async_trait]
impl FromRequestParts<ServeState> for Caller {
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, state: &ServeState) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(Caller(None));
        };
        let value = value
            .to_str()
            .map_err(|_| MarketError::unauthenticated("authorization header is not ASCII"))?;
        let input = parse_bearer(value)?;
        let verified = state.market().authenticator().authenticate(input).await?;
        let actor = state.market().directory().resolve(&verified).await?;
        Ok(Caller(Some(actor)))
    }
}

/// `Json<T>` with body errors reported as `INPUT.INVALID`.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = MarketError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(MarketError::invalid_input(&rejection.body_text())),
        }
    }
}

/// `Query<T>` with the same error mapping.
pub struct QueryArgs<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for QueryArgs<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = MarketError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryArgs(value)),
            Err(rejection) => Err(MarketError::invalid_input(&rejection.body_text())),
        }
    }
}

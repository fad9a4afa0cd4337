use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::errors::MarketError;
use crate::payments::PaymentIntentRequest;
use crate::server::extract::{Caller, JsonBody};
use crate::server::ServeState;

pub(crate) fn router(issue_tokens: bool) -> Router<ServeState> {
    let router = Router::new().route("/create-payment-intent", post(payment_intent_handler));
    if issue_tokens {
        router.route("/get-access-token", post(access_token_handler))
    } else {
        router
    }
}

#[instrument(name = "uphone.payments.intent", skip(state, caller, body))]
async fn payment_intent_handler(
    State(state): State<ServeState>,
    caller: Caller,
    JsonBody(body): JsonBody<PaymentIntentRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let intent = state
        .market()
        .payments()
        .create_intent(caller.actor(), body)
        .await?;
    Ok(Json(intent))
}

#[derive(Deserialize)]
struct TokenRequest {
    uid: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
}

#[instrument(name = "uphone.session.token", skip(state, body))]
async fn access_token_handler(
    State(state): State<ServeState>,
    JsonBody(body): JsonBody<TokenRequest>,
) -> Result<impl IntoResponse, MarketError> {
    let issuer = state
        .market()
        .issuer()
        .ok_or_else(|| MarketError::forbidden("token issuance is disabled"))?;
    let access_token = issuer.issue(&body.uid, body.email.as_deref())?;
    Ok(Json(TokenResponse { access_token }))
}

use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uphone_types::prelude::Id;

use crate::errors::MarketError;
use crate::model::CreateReport;
use crate::server::extract::{Caller, JsonBody, QueryArgs};
use crate::server::ServeState;

pub(crate) fn router() -> Router<ServeState> {
    Router::new().route(
        "/reports",
        post(create_handler).get(list_handler).delete(delete_handler),
    )
}

#[derive(Deserialize)]
struct IdQuery {
    id: Id,
}

#[instrument(name = "uphone.reports.create", skip(state, caller, body))]
async fn create_handler(
    State(state): State<ServeState>,
    caller: Caller,
    JsonBody(body): JsonBody<CreateReport>,
) -> Result<impl IntoResponse, MarketError> {
    let report = state.market().moderation().create(caller.actor(), body).await?;
    Ok(Json(report))
}

#[instrument(name = "uphone.reports.list", skip(state, caller))]
async fn list_handler(
    State(state): State<ServeState>,
    caller: Caller,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.market().moderation().list(caller.actor()).await?))
}

#[instrument(name = "uphone.reports.delete", skip(state, caller, query))]
async fn delete_handler(
    State(state): State<ServeState>,
    caller: Caller,
    QueryArgs(query): QueryArgs<IdQuery>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .market()
        .moderation()
        .delete(caller.actor(), &query.id)
        .await?;
    Ok(Json(json!({ "acknowledged": true, "deletedCount": 1 })))
}

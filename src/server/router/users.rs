use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::instrument;
use uphone_types::prelude::Id;

use crate::directory::Registered;
use crate::errors::MarketError;
use crate::model::{ProfilePatch, PublicProfile, Registration};
use crate::server::extract::{Caller, JsonBody};
use crate::server::ServeState;

pub(crate) fn router() -> Router<ServeState> {
    Router::new()
        .route("/users", post(register_handler).get(list_handler))
        .route(
            "/users/:id",
            get(profile_handler)
                .patch(patch_handler)
                .delete(archive_handler),
        )
}

#[instrument(name = "uphone.users.register", skip(state, body))]
async fn register_handler(
    State(state): State<ServeState>,
    JsonBody(body): JsonBody<Registration>,
) -> Result<impl IntoResponse, MarketError> {
    let registered = state.market().directory().register(body).await?;
    let (status, message) = match &registered {
        Registered::Created(_) => (StatusCode::CREATED, "created"),
        Registered::AlreadyExists(_) => (StatusCode::OK, "user already exists"),
    };
    let user = PublicProfile::from(registered.principal());
    Ok((status, Json(json!({ "message": message, "user": user }))))
}

#[instrument(name = "uphone.users.list", skip(state, caller))]
async fn list_handler(
    State(state): State<ServeState>,
    caller: Caller,
) -> Result<impl IntoResponse, MarketError> {
    let principals = state.market().directory().list(caller.actor()).await?;
    Ok(Json(principals))
}

#[instrument(name = "uphone.users.profile", skip(state))]
async fn profile_handler(
    State(state): State<ServeState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, MarketError> {
    let profile = state.market().directory().public_profile(&id).await?;
    Ok(Json(profile))
}

#[instrument(name = "uphone.users.patch", skip(state, caller, body))]
async fn patch_handler(
    State(state): State<ServeState>,
    Path(id): Path<Id>,
    caller: Caller,
    JsonBody(body): JsonBody<ProfilePatch>,
) -> Result<impl IntoResponse, MarketError> {
    let principal = state
        .market()
        .directory()
        .patch_profile(caller.actor(), &id, body)
        .await?;
    Ok(Json(principal))
}

#[instrument(name = "uphone.users.archive", skip(state, caller))]
async fn archive_handler(
    State(state): State<ServeState>,
    Path(id): Path<Id>,
    caller: Caller,
) -> Result<impl IntoResponse, MarketError> {
    let archived = state.market().directory().archive(caller.actor(), &id).await?;
    Ok(Json(json!({
        "acknowledged": true,
        "archivedId": archived.id,
        "userId": archived.principal.id,
    })))
}

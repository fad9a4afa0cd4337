use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uphone_types::prelude::Id;

use crate::errors::MarketError;
use crate::model::{BookingPatch, CreateBooking};
use crate::server::extract::{Caller, JsonBody, QueryArgs};
use crate::server::ServeState;

pub(crate) fn router() -> Router<ServeState> {
    Router::new()
        .route("/bookings", post(create_handler).get(list_handler))
        .route("/bookings/:id", patch(patch_handler))
}

#[derive(Deserialize)]
struct UidQuery {
    uid: Option<Id>,
}

#[instrument(name = "uphone.bookings.create", skip(state, caller, body))]
async fn create_handler(
    State(state): State<ServeState>,
    caller: Caller,
    JsonBody(body): JsonBody<CreateBooking>,
) -> Result<impl IntoResponse, MarketError> {
    let booking = state.market().bookings().create(caller.actor(), body).await?;
    Ok((StatusCode::ACCEPTED, Json(booking)))
}

#[instrument(name = "uphone.bookings.list", skip(state, caller, query))]
async fn list_handler(
    State(state): State<ServeState>,
    caller: Caller,
    QueryArgs(query): QueryArgs<UidQuery>,
) -> Result<impl IntoResponse, MarketError> {
    let views = state
        .market()
        .bookings()
        .list_for_buyer(caller.actor(), query.uid)
        .await?;
    Ok(Json(views))
}

#[instrument(name = "uphone.bookings.patch", skip(state, caller, body))]
async fn patch_handler(
    State(state): State<ServeState>,
    Path(id): Path<Id>,
    caller: Caller,
    JsonBody(body): JsonBody<BookingPatch>,
) -> Result<impl IntoResponse, MarketError> {
    let booking = state
        .market()
        .bookings()
        .patch(caller.actor(), &id, body)
        .await?;
    Ok(Json(booking))
}

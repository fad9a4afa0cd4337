use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uphone_types::prelude::Id;

use crate::errors::MarketError;
use crate::model::{ListingPatch, ListingQuery, NewListing};
use crate::server::extract::{Caller, JsonBody, QueryArgs};
use crate::server::ServeState;

pub(crate) fn router() -> Router<ServeState> {
    Router::new()
        .route(
            "/products",
            get(list_handler).post(create_handler).delete(delete_handler),
        )
        .route("/products/:id", get(get_handler).patch(patch_handler))
        .route("/advertised-products", get(advertised_handler))
        .route("/brands/:brand_id/products", get(brand_handler))
        .route("/my-products", get(mine_handler))
}

#[derive(Deserialize)]
struct IdQuery {
    id: Id,
}

#[derive(Deserialize)]
struct UidQuery {
    uid: Option<Id>,
}

#[instrument(name = "uphone.products.list", skip(state, query))]
async fn list_handler(
    State(state): State<ServeState>,
    QueryArgs(query): QueryArgs<ListingQuery>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.market().listings().list(&query).await?))
}

#[instrument(name = "uphone.products.get", skip(state))]
async fn get_handler(
    State(state): State<ServeState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.market().listings().get(&id).await?))
}

#[instrument(name = "uphone.products.advertised", skip(state))]
async fn advertised_handler(State(state): State<ServeState>) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.market().listings().advertised().await?))
}

#[instrument(name = "uphone.products.brand", skip(state))]
async fn brand_handler(
    State(state): State<ServeState>,
    Path(brand_id): Path<String>,
) -> Result<impl IntoResponse, MarketError> {
    Ok(Json(state.market().listings().by_brand(&brand_id).await?))
}

#[instrument(name = "uphone.products.mine", skip(state, caller, query))]
async fn mine_handler(
    State(state): State<ServeState>,
    caller: Caller,
    QueryArgs(query): QueryArgs<UidQuery>,
) -> Result<impl IntoResponse, MarketError> {
    let listings = state
        .market()
        .listings()
        .mine(caller.actor(), query.uid)
        .await?;
    Ok(Json(listings))
}

#[instrument(name = "uphone.products.create", skip(state, caller, body))]
async fn create_handler(
    State(state): State<ServeState>,
    caller: Caller,
    JsonBody(body): JsonBody<NewListing>,
) -> Result<impl IntoResponse, MarketError> {
    let inserted = state.market().listings().create(caller.actor(), body).await?;
    Ok(Json(inserted))
}

#[instrument(name = "uphone.products.patch", skip(state, caller, body))]
async fn patch_handler(
    State(state): State<ServeState>,
    Path(id): Path<Id>,
    caller: Caller,
    JsonBody(body): JsonBody<ListingPatch>,
) -> Result<impl IntoResponse, MarketError> {
    let listing = state
        .market()
        .listings()
        .patch(caller.actor(), &id, body)
        .await?;
    Ok(Json(listing))
}

#[instrument(name = "uphone.products.delete", skip(state, caller, query))]
async fn delete_handler(
    State(state): State<ServeState>,
    caller: Caller,
    QueryArgs(query): QueryArgs<IdQuery>,
) -> Result<impl IntoResponse, MarketError> {
    state
        .market()
        .listings()
        .delete(caller.actor(), &query.id)
        .await?;
    Ok(Json(json!({ "acknowledged": true, "deletedCount": 1 })))
}

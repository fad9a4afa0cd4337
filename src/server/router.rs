use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use crate::metrics;

mod bookings;
mod payments;
mod products;
mod reports;
mod users;

use super::state::{HealthSnapshot, ServeState};

/// The full HTTP surface, ready to serve.
pub fn build_router(state: ServeState, allowed_origins: &[String]) -> Router {
    let issue_tokens = state.market().issues_tokens();
    shell_router()
        .merge(api_router(issue_tokens))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

fn shell_router() -> Router<ServeState> {
    Router::new()
        .route("/", get(|| async { "uPhone server is running" }))
        .route("/health", get(health_handler))
        .route("/livez", get(live_handler))
        .route("/readyz", get(ready_handler))
        .route("/metrics", get(metrics::metrics_handler))
}

fn api_router(issue_tokens: bool) -> Router<ServeState> {
    Router::new()
        .merge(users::router())
        .merge(products::router())
        .merge(bookings::router())
        .merge(reports::router())
        .merge(payments::router(issue_tokens))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(origin = %origin, ?err, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

async fn health_handler(State(state): State<ServeState>) -> impl IntoResponse {
    let snapshot = state.health().snapshot();
    Json(json!({
        "status": "ok",
        "phase": snapshot.phase,
        "since": snapshot.since,
    }))
}

fn probe(healthy: bool, snapshot: HealthSnapshot) -> impl IntoResponse {
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(snapshot))
}

async fn live_handler(State(state): State<ServeState>) -> impl IntoResponse {
    let snapshot = state.health().snapshot();
    probe(snapshot.live(), snapshot)
}

async fn ready_handler(State(state): State<ServeState>) -> impl IntoResponse {
    let snapshot = state.health().snapshot();
    probe(snapshot.ready(), snapshot)
}

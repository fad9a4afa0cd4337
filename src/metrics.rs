use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
use once_cell::sync::{Lazy, OnceCell};
use prometheus::{core::Collector, opts, Encoder, IntCounter, IntCounterVec, Registry, TextEncoder};
use tracing::error;
use uphone_tx::saga::SagaState;

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);
static REGISTER_ONCE: OnceCell<()> = OnceCell::new();

lazy_static! {
    pub static ref LISTINGS_CREATED: IntCounter = IntCounter::new(
        "uphone_listings_created_total",
        "Listings created by sellers"
    )
    .unwrap();
    pub static ref BOOKINGS_CREATED: IntCounter = IntCounter::new(
        "uphone_bookings_created_total",
        "Bookings that reserved a listing"
    )
    .unwrap();
    pub static ref BOOKING_CONFLICTS: IntCounter = IntCounter::new(
        "uphone_booking_conflicts_total",
        "Booking attempts on listings that were no longer available"
    )
    .unwrap();
    static ref SAGA_ABORTS: IntCounterVec = IntCounterVec::new(
        opts!(
            "uphone_saga_aborts_total",
            "Sagas that failed after executing at least one step"
        ),
        &["saga", "state"]
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register metric");
        }
    }
}

pub fn register_metrics() {
    REGISTER_ONCE.get_or_init(|| {
        let registry = global_registry();
        uphone_auth::observe::register_metrics(registry);
        register(registry, LISTINGS_CREATED.clone());
        register(registry, BOOKINGS_CREATED.clone());
        register(registry, BOOKING_CONFLICTS.clone());
        register(registry, SAGA_ABORTS.clone());
    });
}

fn state_label(state: SagaState) -> &'static str {
    match state {
        SagaState::Completed => "completed",
        SagaState::Compensated => "compensated",
        SagaState::CompensationFailed => "compensation_failed",
    }
}

pub fn record_saga_abort(saga: &str, state: SagaState) {
    SAGA_ABORTS
        .with_label_values(&[saga, state_label(state)])
        .inc();
}

pub fn saga_abort_count(saga: &str, state: SagaState) -> u64 {
    SAGA_ABORTS
        .with_label_values(&[saga, state_label(state)])
        .get()
}

pub fn global_registry() -> &'static Registry {
    &GLOBAL_REGISTRY
}

/// Prometheus text exposition of the global registry.
pub async fn metrics_handler() -> Response {
    register_metrics();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&global_registry().gather(), &mut buffer) {
        error!(?err, "failed to encode prometheus metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "metric encode error").into_response();
    }

    match (
        String::from_utf8(buffer),
        HeaderValue::from_str(encoder.format_type()),
    ) {
        (Ok(body), Ok(content_type)) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        (Err(err), _) => {
            error!(?err, "failed to convert prometheus metrics to utf8");
            (StatusCode::INTERNAL_SERVER_ERROR, "metric encode error").into_response()
        }
        (_, Err(err)) => {
            error!(?err, "failed to build content-type header");
            (StatusCode::INTERNAL_SERVER_ERROR, "metric encode error").into_response()
        }
    }
}

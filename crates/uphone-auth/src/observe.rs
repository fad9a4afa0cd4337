use crate::model::{Action, DenyReason};
use lazy_static::lazy_static;
use prometheus::{core::Collector, opts, IntCounterVec, Registry};
use tracing::error;

lazy_static! {
    static ref AUTHZ_DENIALS: IntCounterVec = IntCounterVec::new(
        opts!(
            "uphone_authz_denials_total",
            "Access-control denials grouped by action and reason"
        ),
        &["action", "reason"]
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register auth metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, AUTHZ_DENIALS.clone());
}

pub fn record_denial(action: Action, reason: DenyReason) {
    AUTHZ_DENIALS
        .with_label_values(&[action.as_str(), reason.as_str()])
        .inc();
}

pub fn denial_count(action: Action, reason: DenyReason) -> u64 {
    AUTHZ_DENIALS
        .with_label_values(&[action.as_str(), reason.as_str()])
        .get()
}

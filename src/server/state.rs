use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use uphone_types::prelude::Timestamp;

use crate::market::Marketplace;

#[derive(Clone)]
pub struct ServeState {
    market: Arc<Marketplace>,
    health: Arc<ServeHealth>,
}

impl ServeState {
    pub fn new(market: Arc<Marketplace>) -> Self {
        Self::with_health(market, Arc::new(ServeHealth::new()))
    }

    pub fn with_health(market: Arc<Marketplace>, health: Arc<ServeHealth>) -> Self {
        Self { market, health }
    }

    pub fn market(&self) -> &Marketplace {
        &self.market
    }

    pub fn health(&self) -> &ServeHealth {
        &self.health
    }
}

/// Lifecycle of the listening process, as reported by the probes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServePhase {
    Starting,
    Serving,
    Draining,
}

impl ServePhase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ServePhase::Serving,
            2 => ServePhase::Draining,
            _ => ServePhase::Starting,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub phase: ServePhase,
    /// When the process entered `phase`.
    pub since: Timestamp,
}

impl HealthSnapshot {
    pub fn live(&self) -> bool {
        self.phase != ServePhase::Draining
    }

    pub fn ready(&self) -> bool {
        self.phase == ServePhase::Serving
    }
}

pub struct ServeHealth {
    phase: AtomicU8,
    since: Mutex<Timestamp>,
}

impl Default for ServeHealth {
    fn default() -> Self {
        Self::new()
    }
}

impl ServeHealth {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(ServePhase::Starting as u8),
            since: Mutex::new(Timestamp::now()),
        }
    }

    pub fn enter(&self, phase: ServePhase) {
        let mut since = self.since.lock();
        self.phase.store(phase as u8, Ordering::SeqCst);
        *since = Timestamp::now();
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let since = self.since.lock();
        HealthSnapshot {
            phase: ServePhase::from_u8(self.phase.load(Ordering::SeqCst)),
            since: *since,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_follow_the_phase() {
        let health = ServeHealth::new();
        let starting = health.snapshot();
        assert!(starting.live());
        assert!(!starting.ready());

        health.enter(ServePhase::Serving);
        assert!(health.snapshot().ready());

        health.enter(ServePhase::Draining);
        let draining = health.snapshot();
        assert!(!draining.live());
        assert!(!draining.ready());
        assert!(draining.since >= starting.since);
    }
}

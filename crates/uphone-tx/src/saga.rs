//! In-process sagas.
//!
//! A saga is an ordered list of steps sharing a mutable context. Steps run in
//! order; when one fails, every step that already executed is compensated in
//! reverse order and the saga reports the original failure.

use crate::errors::TxError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use uphone_errors::prelude::CauseEntry;

#[async_trait]
pub trait SagaStep<C>: Send + Sync
where
    C: Send + Sync,
{
    fn name(&self) -> &'static str;

    async fn execute(&self, ctx: &mut C) -> Result<(), TxError>;

    /// Undoes a successful `execute`. Steps with nothing to undo keep the default.
    async fn compensate(&self, _ctx: &mut C) -> Result<(), TxError> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SagaState {
    Completed,
    /// A step failed and every executed step was undone.
    Compensated,
    /// A step failed and at least one compensation failed too; the
    /// documents touched by the saga may be inconsistent.
    CompensationFailed,
}

#[derive(Debug)]
pub struct SagaAbort {
    pub saga: &'static str,
    pub failed_step: &'static str,
    pub state: SagaState,
    pub error: TxError,
}

impl SagaAbort {
    pub fn into_error(self) -> TxError {
        self.error
    }
}

pub struct Saga<C>
where
    C: Send + Sync,
{
    name: &'static str,
    steps: Vec<Box<dyn SagaStep<C>>>,
}

impl<C> Saga<C>
where
    C: Send + Sync,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: impl SagaStep<C> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub async fn run(&self, ctx: &mut C) -> Result<SagaState, SagaAbort> {
        for (idx, step) in self.steps.iter().enumerate() {
            debug!(saga = self.name, step = step.name(), "executing saga step");
            if let Err(err) = step.execute(ctx).await {
                warn!(
                    saga = self.name,
                    step = step.name(),
                    code = err.0.code.0,
                    "saga step failed, compensating"
                );
                let (state, error) = self.unwind(idx, ctx, err).await;
                return Err(SagaAbort {
                    saga: self.name,
                    failed_step: step.name(),
                    state,
                    error,
                });
            }
        }
        Ok(SagaState::Completed)
    }

    async fn unwind(&self, failed: usize, ctx: &mut C, err: TxError) -> (SagaState, TxError) {
        let mut state = SagaState::Compensated;
        let mut obj = err.into_inner();
        for step in self.steps[..failed].iter().rev() {
            if let Err(comp_err) = step.compensate(ctx).await {
                error!(
                    saga = self.name,
                    step = step.name(),
                    error = ?comp_err.0.to_audit(),
                    "saga compensation failed"
                );
                state = SagaState::CompensationFailed;
                obj.causes.push(CauseEntry {
                    code: comp_err.0.code.0.to_string(),
                    summary: format!("compensation of {} failed", step.name()),
                });
            }
        }
        (state, TxError(obj))
    }
}

use std::sync::{Arc, Mutex};
use uphone_tx::prelude::*;

#[derive(Default)]
struct Ledger {
    log: Vec<String>,
}

struct Record {
    name: &'static str,
    fail: bool,
    fail_compensation: bool,
    undone: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait::async_trait]
impl SagaStep<Ledger> for Record {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn execute(&self, ctx: &mut Ledger) -> Result<(), TxError> {
        if self.fail {
            return Err(TxError::conflict("step refused"));
        }
        ctx.log.push(self.name.to_string());
        Ok(())
    }

    async fn compensate(&self, ctx: &mut Ledger) -> Result<(), TxError> {
        if self.fail_compensation {
            return Err(TxError::unavailable("undo failed"));
        }
        ctx.log.retain(|entry| entry != self.name);
        self.undone.lock().unwrap().push(self.name);
        Ok(())
    }
}

fn step(name: &'static str, undone: &Arc<Mutex<Vec<&'static str>>>) -> Record {
    Record {
        name,
        fail: false,
        fail_compensation: false,
        undone: undone.clone(),
    }
}

#[tokio::test]
async fn all_steps_complete() {
    let undone = Arc::new(Mutex::new(Vec::new()));
    let saga = Saga::new("demo")
        .step(step("a", &undone))
        .step(step("b", &undone));
    let mut ledger = Ledger::default();

    let state = saga.run(&mut ledger).await.unwrap();
    assert_eq!(state, SagaState::Completed);
    assert_eq!(ledger.log, vec!["a", "b"]);
    assert!(undone.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failure_compensates_in_reverse_order() {
    let undone = Arc::new(Mutex::new(Vec::new()));
    let mut failing = step("c", &undone);
    failing.fail = true;
    let saga = Saga::new("demo")
        .step(step("a", &undone))
        .step(step("b", &undone))
        .step(failing);
    let mut ledger = Ledger::default();

    let abort = saga.run(&mut ledger).await.unwrap_err();
    assert_eq!(abort.state, SagaState::Compensated);
    assert_eq!(abort.failed_step, "c");
    assert_eq!(abort.error.kind(), uphone_errors::kind::ErrorKind::Conflict);
    assert!(ledger.log.is_empty());
    assert_eq!(*undone.lock().unwrap(), vec!["b", "a"]);
}

#[tokio::test]
async fn failed_compensation_is_reported() {
    let undone = Arc::new(Mutex::new(Vec::new()));
    let mut sticky = step("a", &undone);
    sticky.fail_compensation = true;
    let mut failing = step("b", &undone);
    failing.fail = true;
    let saga = Saga::new("demo").step(sticky).step(failing);
    let mut ledger = Ledger::default();

    let abort = saga.run(&mut ledger).await.unwrap_err();
    assert_eq!(abort.state, SagaState::CompensationFailed);
    let causes = abort.error.0.causes.clone();
    assert_eq!(causes.len(), 1);
    assert_eq!(ledger.log, vec!["a"]);
}

pub use crate::errors::TxError;
pub use crate::saga::{Saga, SagaAbort, SagaState, SagaStep};

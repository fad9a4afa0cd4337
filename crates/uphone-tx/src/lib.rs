//! Compensating multi-step writes.

pub mod errors;
pub mod prelude;
pub mod saga;

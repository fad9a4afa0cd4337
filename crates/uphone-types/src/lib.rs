//! Identifiers, roles and timestamps shared by every uPhone crate.

pub mod id;
pub mod prelude;
pub mod role;
pub mod time;

//! Error domain shared by the uPhone crates: stable codes, the error object
//! every crate wraps, and the client and log views rendered from it.

pub mod code;
pub mod kind;
pub mod model;
pub mod prelude;
pub mod render;

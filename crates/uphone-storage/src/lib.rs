//! Document repositories keyed by string id, with an in-memory backend.

pub mod errors;
pub mod model;
pub mod prelude;

pub mod spi {
    pub mod repo;

    pub use repo::*;
}

#[cfg(feature = "memory")]
pub mod memory;

pub use errors::StorageError;
pub use model::*;
pub use spi::*;

pub use crate::errors::StorageError;
pub use crate::model::{Entity, QueryParams, SortOrder};
pub use crate::spi::*;

#[cfg(feature = "memory")]
pub use crate::memory::{InMemoryRepository, MemoryDatastore};

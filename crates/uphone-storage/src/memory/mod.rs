pub mod datastore;
pub mod repo;

pub use datastore::MemoryDatastore;
pub use repo::InMemoryRepository;

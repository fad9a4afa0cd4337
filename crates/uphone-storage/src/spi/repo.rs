use crate::errors::StorageError;
use crate::model::{Entity, QueryParams};
use async_trait::async_trait;

/// Generic document-store collection.
///
/// `compare_and_swap` and `delete_if` are the conditional writes the
/// marketplace relies on for state transitions: the guard in `expected` and
/// the write happen as one atomic step, and the return value says whether the
/// write took place.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Inserts a new document. Fails with a conflict when the id is taken.
    async fn create(&self, entity: &E) -> Result<(), StorageError>;

    async fn get(&self, id: &str) -> Result<Option<E>, StorageError>;

    async fn select(&self, params: QueryParams) -> Result<Vec<E>, StorageError>;

    /// Merge-patches an existing document. Fails with not-found when absent.
    async fn update(&self, id: &str, patch: serde_json::Value) -> Result<E, StorageError>;

    /// Applies `patch` only if every field in `expected` currently matches.
    /// `Ok(None)` means the document is absent or did not match.
    async fn compare_and_swap(
        &self,
        id: &str,
        expected: serde_json::Value,
        patch: serde_json::Value,
    ) -> Result<Option<E>, StorageError>;

    async fn delete(&self, id: &str) -> Result<(), StorageError>;

    /// Deletes only if every field in `expected` currently matches.
    async fn delete_if(&self, id: &str, expected: serde_json::Value)
        -> Result<bool, StorageError>;
}

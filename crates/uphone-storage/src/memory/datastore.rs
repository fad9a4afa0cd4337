use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

type Table = HashMap<String, Value>;

/// Process-local document store. Cloning shares the underlying tables.
#[derive(Clone, Default)]
pub struct MemoryDatastore {
    tables: Arc<RwLock<HashMap<&'static str, Table>>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<R>(&self, table: &str, f: impl FnOnce(&Table) -> R) -> Option<R> {
        self.tables.read().get(table).map(f)
    }

    /// Inserts only when `id` is free. Returns false when it was taken.
    pub fn insert_new(&self, table: &'static str, id: &str, value: Value) -> bool {
        let mut tables = self.tables.write();
        let rows = tables.entry(table).or_default();
        if rows.contains_key(id) {
            return false;
        }
        rows.insert(id.to_string(), value);
        true
    }

    pub fn fetch(&self, table: &str, id: &str) -> Option<Value> {
        self.read(table, |rows| rows.get(id).cloned()).flatten()
    }

    pub fn remove(&self, table: &str, id: &str) -> Option<Value> {
        self.tables.write().get_mut(table)?.remove(id)
    }

    pub fn list(&self, table: &str) -> Vec<Value> {
        self.read(table, |rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Runs `f` against the slot for `id` while holding the write lock, so a
    /// read-check-write inside `f` is atomic with respect to every other writer.
    /// Leaving the slot `None` deletes the document.
    pub fn modify<R>(
        &self,
        table: &'static str,
        id: &str,
        f: impl FnOnce(&mut Option<Value>) -> R,
    ) -> R {
        let mut tables = self.tables.write();
        let rows = tables.entry(table).or_default();
        let mut slot = rows.remove(id);
        let out = f(&mut slot);
        if let Some(value) = slot {
            rows.insert(id.to_string(), value);
        }
        out
    }

    pub fn count(&self, table: &str) -> usize {
        self.read(table, HashMap::len).unwrap_or(0)
    }
}

use super::datastore::MemoryDatastore;
use crate::errors::StorageError;
use crate::model::{Entity, QueryParams, SortOrder};
use crate::spi::repo::Repository;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::marker::PhantomData;
use tracing::trace;

#[derive(Clone)]
pub struct InMemoryRepository<E: Entity> {
    store: MemoryDatastore,
    table: &'static str,
    _marker: PhantomData<E>,
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new(store: &MemoryDatastore) -> Self {
        Self {
            store: store.clone(),
            table: E::TABLE,
            _marker: PhantomData,
        }
    }
}

/// `$set` semantics: every top-level field of `patch` replaces the stored one.
fn apply_set(doc: &mut Map<String, Value>, patch: &Value) -> Result<(), StorageError> {
    let fields = patch
        .as_object()
        .ok_or_else(|| StorageError::internal("patch must be a JSON object"))?;
    for (field, value) in fields {
        doc.insert(field.clone(), value.clone());
    }
    Ok(())
}

/// Top-level equality on every field of `filter`. A null filter matches all.
pub(crate) fn matches_filter(doc: &Value, filter: &Value) -> bool {
    match filter.as_object() {
        Some(fields) => fields
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected)),
        None => filter.is_null(),
    }
}

fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn decode<E: Entity>(value: Value) -> Result<E, StorageError> {
    serde_json::from_value(value).map_err(|e| StorageError::internal(&e.to_string()))
}

/// Applies the patch to a copy and checks that it still decodes as `E`
/// before anything is written back.
fn patched<E: Entity>(base: &Value, id: &str, patch: &Value) -> Result<(Value, E), StorageError> {
    let mut doc = base.as_object().cloned().unwrap_or_default();
    apply_set(&mut doc, patch)?;
    doc.insert("id".into(), Value::String(id.to_string()));
    let next = Value::Object(doc);
    let entity = decode::<E>(next.clone())?;
    Ok((next, entity))
}

#[async_trait]
impl<E> Repository<E> for InMemoryRepository<E>
where
    E: Entity + Send + Sync,
{
    async fn create(&self, entity: &E) -> Result<(), StorageError> {
        let doc = serde_json::to_value(entity)
            .map_err(|err| StorageError::internal(&format!("encode {}: {err}", self.table)))?;
        if !self.store.insert_new(self.table, entity.id(), doc) {
            return Err(StorageError::conflict(&format!(
                "{} {} already exists",
                self.table,
                entity.id()
            )));
        }
        trace!(table = self.table, id = entity.id(), "created");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<E>, StorageError> {
        self.store.fetch(self.table, id).map(decode::<E>).transpose()
    }

    async fn select(&self, params: QueryParams) -> Result<Vec<E>, StorageError> {
        let mut values: Vec<Value> = self
            .store
            .list(self.table)
            .into_iter()
            .filter(|value| matches_filter(value, &params.filter))
            .collect();
        if let Some((field, order)) = params.order_by.as_ref() {
            values.sort_by(|a, b| {
                let ord = compare_field(a, b, field);
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }
        let limit = params.limit.unwrap_or(u32::MAX) as usize;
        values.into_iter().take(limit).map(decode::<E>).collect()
    }

    async fn update(&self, id: &str, patch: Value) -> Result<E, StorageError> {
        self.store.modify(self.table, id, |slot| {
            let current = slot
                .as_ref()
                .ok_or_else(|| StorageError::not_found(&format!("{} {id} not found", E::TABLE)))?;
            let (value, entity) = patched::<E>(current, id, &patch)?;
            *slot = Some(value);
            Ok(entity)
        })
    }

    async fn compare_and_swap(
        &self,
        id: &str,
        expected: Value,
        patch: Value,
    ) -> Result<Option<E>, StorageError> {
        let table = self.table;
        self.store.modify(table, id, |slot| {
            let Some(current) = slot.as_ref() else {
                return Ok(None);
            };
            if !matches_filter(current, &expected) {
                trace!(table, id, "compare-and-swap lost");
                return Ok(None);
            }
            let (value, entity) = patched::<E>(current, id, &patch)?;
            *slot = Some(value);
            Ok(Some(entity))
        })
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        match self.store.remove(self.table, id) {
            Some(_) => Ok(()),
            None => Err(StorageError::not_found(&format!("{} {id} not found", self.table))),
        }
    }

    async fn delete_if(&self, id: &str, expected: Value) -> Result<bool, StorageError> {
        Ok(self.store.modify(self.table, id, |slot| match slot.as_ref() {
            Some(current) if matches_filter(current, &expected) => {
                *slot = None;
                true
            }
            _ => false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_filter_matches_everything() {
        assert!(matches_filter(&json!({"a": 1}), &json!({})));
        assert!(matches_filter(&json!({"a": 1}), &Value::Null));
    }

    #[test]
    fn set_replaces_whole_fields() {
        let base = json!({"id": "x", "images": ["a", "b"], "status": "available"});
        let mut doc = base.as_object().cloned().unwrap();
        apply_set(&mut doc, &json!({"images": ["c"]})).unwrap();
        assert_eq!(doc["images"], json!(["c"]));
        assert_eq!(doc["status"], "available");
        assert!(apply_set(&mut doc, &json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn filter_requires_every_field() {
        let doc = json!({"status": "available", "advertise": true});
        assert!(matches_filter(&doc, &json!({"status": "available"})));
        assert!(!matches_filter(
            &doc,
            &json!({"status": "available", "advertise": false})
        ));
        assert!(!matches_filter(&doc, &json!({"missing": 1})));
    }
}

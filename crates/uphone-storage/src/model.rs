use serde::{Deserialize, Serialize};

/// A document persisted in one collection.
pub trait Entity: Sized + serde::de::DeserializeOwned + Serialize + Send + Sync {
    const TABLE: &'static str;
    fn id(&self) -> &str;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Equality filter on top-level document fields, plus optional ordering.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryParams {
    pub filter: serde_json::Value,
    #[serde(default)]
    pub order_by: Option<(String, SortOrder)>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl QueryParams {
    pub fn filter(filter: serde_json::Value) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order_by = Some((field.into(), order));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            filter: serde_json::json!({}),
            order_by: None,
            limit: None,
        }
    }
}

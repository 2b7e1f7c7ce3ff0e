//! Data source specs and pages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Placeholder replaced by the entity id when binding aggregate params.
pub const ENTITY_ID_PLACEHOLDER: &str = "{id}";

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// One named query in an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    pub query_key: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl QueryDescriptor {
    pub fn new(query_key: impl Into<String>) -> Self {
        Self {
            query_key: query_key.into(),
            params: Map::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Params with every `"{id}"` string value replaced by `entity_id`.
    pub fn bind(&self, entity_id: Option<&str>) -> Value {
        let params = self
            .params
            .iter()
            .map(|(name, value)| {
                let value = match (value, entity_id) {
                    (Value::String(s), Some(id)) if s == ENTITY_ID_PLACEHOLDER => Value::String(id.to_string()),
                    _ => value.clone(),
                };
                (name.clone(), value)
            })
            .collect();
        Value::Object(params)
    }
}

/// Where a screen's data comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DataSourceSpec {
    /// A single paginated list query.
    #[serde(rename_all = "camelCase")]
    List { query_key: String },

    /// Named queries resolved concurrently into `{ key -> result }`.
    Aggregate {
        queries: BTreeMap<String, QueryDescriptor>,
    },
}

impl DataSourceSpec {
    pub fn list(query_key: impl Into<String>) -> Self {
        Self::List {
            query_key: query_key.into(),
        }
    }

    /// An aggregate built from `(name, descriptor)` pairs.
    pub fn aggregate<I, K>(queries: I) -> Self
    where
        I: IntoIterator<Item = (K, QueryDescriptor)>,
        K: Into<String>,
    {
        Self::Aggregate {
            queries: queries.into_iter().map(|(k, q)| (k.into(), q)).collect(),
        }
    }
}

/// A page of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<R> {
    pub items: Vec<R>,

    /// Total number of matching records across all pages.
    pub total: usize,

    /// Offset of the first item.
    pub offset: usize,

    pub has_more: bool,
}

impl<R> Page<R> {
    pub fn new(items: Vec<R>, total: usize, offset: usize) -> Self {
        let has_more = offset + items.len() < total;
        Self {
            items,
            total,
            offset,
            has_more,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of pages needed for `total` at `page_size`.
    pub fn page_count(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        self.total.div_ceil(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_has_more() {
        let first = Page::new(vec![0; 25], 40, 0);
        assert!(first.has_more);
        assert_eq!(first.page_count(25), 2);

        let last = Page::new(vec![0; 15], 40, 25);
        assert!(!last.has_more);
    }

    #[test]
    fn test_bind_replaces_placeholder() {
        let descriptor = QueryDescriptor::new("activities.list")
            .param("entityId", json!("{id}"))
            .param("limit", json!(10));
        assert_eq!(
            descriptor.bind(Some("d9")),
            json!({ "entityId": "d9", "limit": 10 })
        );
        assert_eq!(
            descriptor.bind(None),
            json!({ "entityId": "{id}", "limit": 10 })
        );
    }

    #[test]
    fn test_data_source_spec_serde() {
        let spec: DataSourceSpec = serde_json::from_value(json!({
            "kind": "aggregate",
            "queries": {
                "pipeline": { "queryKey": "deals.pipeline" },
                "stats": { "queryKey": "deals.stats", "params": { "range": "month" } }
            }
        }))
        .unwrap();

        match spec {
            DataSourceSpec::Aggregate { queries } => {
                assert_eq!(queries.len(), 2);
                assert_eq!(queries["stats"].params["range"], json!("month"));
            }
            other => panic!("unexpected spec: {:?}", other),
        }
    }
}

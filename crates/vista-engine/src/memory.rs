//! In-memory data source.
//!
//! Serves JSON collections through the same contract a remote query layer
//! would: list queries with filters, search, sort and pagination, lookups by
//! id, canned values, and status mutations. Used by the runner and by tests.

use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

use vista_core::QueryError;

use crate::filter::ListParams;
use crate::source::DataSource;

/// Filter key the list route treats as free-text search.
pub const SEARCH_PARAM: &str = "search";

#[derive(Debug, Clone)]
enum Route {
    List {
        collection: String,
        search_fields: Vec<String>,
    },
    Get {
        collection: String,
    },
    Where {
        collection: String,
        field: String,
    },
    Value(Value),
    SetStatus {
        collection: String,
    },
    Fail(String),
}

/// A `DataSource` over named in-memory collections of JSON objects.
#[derive(Debug, Default)]
pub struct InMemorySource {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    routes: RwLock<HashMap<String, Route>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a collection.
    pub fn with_collection(self, name: impl Into<String>, records: Vec<Value>) -> Self {
        self.collections.write().insert(name.into(), records);
        self
    }

    /// Serve `key` as a paginated list over `collection`.
    ///
    /// The `search` filter matches case-insensitively against `search_fields`.
    pub fn list_route(self, key: impl Into<String>, collection: impl Into<String>, search_fields: &[&str]) -> Self {
        self.route(
            key,
            Route::List {
                collection: collection.into(),
                search_fields: search_fields.iter().map(|f| f.to_string()).collect(),
            },
        )
    }

    /// Serve `key` as a lookup by `params.id`.
    pub fn get_route(self, key: impl Into<String>, collection: impl Into<String>) -> Self {
        self.route(
            key,
            Route::Get {
                collection: collection.into(),
            },
        )
    }

    /// Serve `key` as every record of `collection` whose `field` equals the
    /// `field` param. Used for related lists keyed by a parent id.
    pub fn where_route(self, key: impl Into<String>, collection: impl Into<String>, field: impl Into<String>) -> Self {
        self.route(
            key,
            Route::Where {
                collection: collection.into(),
                field: field.into(),
            },
        )
    }

    /// Serve `key` with a fixed value.
    pub fn value_route(self, key: impl Into<String>, value: Value) -> Self {
        self.route(key, Route::Value(value))
    }

    /// Serve mutation `key` as `{ id, status }` updating `collection`.
    pub fn status_route(self, key: impl Into<String>, collection: impl Into<String>) -> Self {
        self.route(
            key,
            Route::SetStatus {
                collection: collection.into(),
            },
        )
    }

    /// Make `key` fail with `message`.
    pub fn fail_route(self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.route(key, Route::Fail(message.into()))
    }

    fn route(self, key: impl Into<String>, route: Route) -> Self {
        self.routes.write().insert(key.into(), route);
        self
    }

    /// Make an existing route fail from now on.
    pub fn fail(&self, key: &str, message: impl Into<String>) {
        self.routes.write().insert(key.to_string(), Route::Fail(message.into()));
    }

    /// Snapshot of a collection.
    pub fn records(&self, collection: &str) -> Vec<Value> {
        self.collections.read().get(collection).cloned().unwrap_or_default()
    }

    /// Every call so far, in order, as `(key, params)`.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    /// Number of calls made to `key`.
    pub fn call_count(&self, key: &str) -> usize {
        self.calls.lock().iter().filter(|(k, _)| k == key).count()
    }

    fn handle(&self, key: &str, params: &Value) -> Result<Value, QueryError> {
        self.calls.lock().push((key.to_string(), params.clone()));

        let route = self
            .routes
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| QueryError::failed(key, "no route"))?;

        match route {
            Route::List {
                collection,
                search_fields,
            } => {
                let params: ListParams = serde_json::from_value(params.clone()).map_err(|e| QueryError::Decode {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
                let records = self.records(&collection);
                Ok(list_page(records, &params, &search_fields))
            }
            Route::Get { collection } => {
                let id = params
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| QueryError::failed(key, "missing id"))?;
                self.collections
                    .read()
                    .get(&collection)
                    .and_then(|records| records.iter().find(|r| record_id(r) == Some(id)).cloned())
                    .ok_or_else(|| QueryError::failed(key, format!("record '{}' not found", id)))
            }
            Route::Where { collection, field } => {
                let expected = params
                    .get(&field)
                    .ok_or_else(|| QueryError::failed(key, format!("missing {}", field)))?;
                let matching: Vec<Value> = self
                    .records(&collection)
                    .into_iter()
                    .filter(|r| r.get(&field).is_some_and(|actual| value_eq(actual, expected)))
                    .collect();
                Ok(Value::Array(matching))
            }
            Route::Value(value) => Ok(value),
            Route::SetStatus { collection } => {
                let id = params.get("id").and_then(Value::as_str);
                let status = params.get("status").cloned();
                let (Some(id), Some(status)) = (id, status) else {
                    return Err(QueryError::failed(key, "expected { id, status }"));
                };

                let mut collections = self.collections.write();
                let record = collections
                    .get_mut(&collection)
                    .and_then(|records| records.iter_mut().find(|r| record_id(r) == Some(id)))
                    .ok_or_else(|| QueryError::failed(key, format!("record '{}' not found", id)))?;
                if let Some(fields) = record.as_object_mut() {
                    fields.insert("status".to_string(), status);
                }
                tracing::debug!("Set status of '{}' in '{}'", id, collection);
                Ok(record.clone())
            }
            Route::Fail(message) => Err(QueryError::failed(key, message)),
        }
    }
}

impl DataSource for InMemorySource {
    fn query(&self, key: String, params: Value) -> BoxFuture<'static, Result<Value, QueryError>> {
        let result = self.handle(&key, &params);
        Box::pin(async move { result })
    }

    fn mutate(&self, key: String, params: Value) -> BoxFuture<'static, Result<Value, QueryError>> {
        let result = self.handle(&key, &params);
        Box::pin(async move { result })
    }
}

// =============================================================================
// List evaluation
// =============================================================================

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

fn list_page(records: Vec<Value>, params: &ListParams, search_fields: &[String]) -> Value {
    let mut matching: Vec<Value> = records
        .into_iter()
        .filter(|record| matches_filters(record, &params.filters, search_fields))
        .collect();

    if let Some(sort_by) = &params.sort_by {
        matching.sort_by(|a, b| compare_fields(a.get(sort_by), b.get(sort_by)));
        if params.sort_order == vista_core::config::SortOrder::Desc {
            matching.reverse();
        }
    }

    let total = matching.len();
    let items: Vec<Value> = matching
        .into_iter()
        .skip(params.offset)
        .take(params.limit.unwrap_or(usize::MAX))
        .collect();

    json!({ "items": items, "total": total })
}

fn matches_filters(record: &Value, filters: &Map<String, Value>, search_fields: &[String]) -> bool {
    filters.iter().all(|(key, expected)| {
        if key == SEARCH_PARAM {
            return matches_search(record, expected, search_fields);
        }
        let actual = record.get(key).unwrap_or(&Value::Null);
        match expected {
            Value::Array(any_of) => any_of.iter().any(|e| value_eq(actual, e)),
            other => value_eq(actual, other),
        }
    })
}

fn matches_search(record: &Value, term: &Value, search_fields: &[String]) -> bool {
    let Some(term) = term.as_str() else {
        return true;
    };
    let term = term.to_lowercase();
    search_fields.iter().any(|field| match record.get(field) {
        Some(Value::String(s)) => s.to_lowercase().contains(&term),
        Some(Value::Null) | None => false,
        Some(other) => other.to_string().to_lowercase().contains(&term),
    })
}

/// Equality that lets string filter values match numbers and booleans.
fn value_eq(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (actual, expected) {
        (Value::Number(n), Value::String(s)) => n.to_string() == *s,
        (Value::Bool(b), Value::String(s)) => b.to_string() == *s,
        _ => false,
    }
}

fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

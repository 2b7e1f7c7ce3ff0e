//! Filter & search pipeline.
//!
//! Turns the values a user entered for each declared filter into the parameter
//! object a list query receives. Each filter kind has its own omission rule:
//!
//! | Kind          | Value           | Parameter                   |
//! |---------------|-----------------|-----------------------------|
//! | `search`      | trimmed text    | omitted when empty          |
//! | `select`      | option value    | omitted for `"all"` / empty |
//! | `toggle`      | bool            | only `true` is sent         |
//! | `multiSelect` | list of values  | omitted when empty (OR)     |

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use vista_core::config::{FilterKind, FilterSpec, SortOrder, ALL_OPTION};

// =============================================================================
// Filter values
// =============================================================================

/// A value entered for one filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
    Many(Vec<String>),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<&[&str]> for FilterValue {
    fn from(values: &[&str]) -> Self {
        Self::Many(values.iter().map(|v| v.to_string()).collect())
    }
}

/// Current filter values of a screen, keyed by filter key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterValues(BTreeMap<String, FilterValue>);

impl FilterValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FilterValue> {
        self.0.remove(key)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Build the filter parameters for a list query.
///
/// Values for keys no filter declares are ignored. Select values outside the
/// declared options are passed through unchanged.
pub fn build_params(specs: &[FilterSpec], values: &FilterValues) -> Map<String, Value> {
    let mut params = Map::new();

    for spec in specs {
        let Some(value) = values.get(&spec.key) else {
            continue;
        };

        let param = match (spec.kind, value) {
            (FilterKind::Search, FilterValue::Text(text)) => {
                let text = text.trim();
                (!text.is_empty()).then(|| json!(text))
            }
            (FilterKind::Select, FilterValue::Text(selected)) => {
                if selected.is_empty() || selected == ALL_OPTION {
                    None
                } else {
                    if !spec.has_option(selected) {
                        tracing::debug!(
                            "Filter '{}' value '{}' is not a declared option, passing through",
                            spec.key,
                            selected
                        );
                    }
                    Some(json!(selected))
                }
            }
            (FilterKind::Toggle, FilterValue::Bool(on)) => on.then(|| json!(true)),
            (FilterKind::MultiSelect, FilterValue::Many(selected)) => {
                let selected: Vec<&String> = selected.iter().filter(|v| v.as_str() != ALL_OPTION).collect();
                (!selected.is_empty()).then(|| json!(selected))
            }
            (kind, value) => {
                tracing::warn!("Filter '{}' of type {} ignores value {:?}", spec.key, kind, value);
                None
            }
        };

        if let Some(param) = param {
            params.insert(spec.key.clone(), param);
        }
    }

    params
}

/// Whether any filter currently narrows the result set.
pub fn has_active_filters(specs: &[FilterSpec], values: &FilterValues) -> bool {
    !build_params(specs, values).is_empty()
}

// =============================================================================
// List params
// =============================================================================

/// Parameters of a paginated list query.
///
/// Serialized as `{ filters, sortBy, sortOrder, limit, offset }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default)]
    pub filters: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,

    #[serde(default)]
    pub sort_order: SortOrder,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    #[serde(default)]
    pub offset: usize,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filters(mut self, filters: Map<String, Value>) -> Self {
        self.filters = filters;
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.filters.insert(key.into(), value);
        self
    }

    pub fn sort(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(key.into());
        self.sort_order = order;
        self
    }

    pub fn page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    /// The parameter object sent to the data source.
    pub fn to_query(&self) -> Value {
        let mut query = Map::new();
        query.insert("filters".to_string(), Value::Object(self.filters.clone()));
        if let Some(sort_by) = &self.sort_by {
            query.insert("sortBy".to_string(), json!(sort_by));
        }
        query.insert(
            "sortOrder".to_string(),
            json!(match self.sort_order {
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            }),
        );
        if let Some(limit) = self.limit {
            query.insert("limit".to_string(), json!(limit));
        }
        query.insert("offset".to_string(), json!(self.offset));
        Value::Object(query)
    }
}

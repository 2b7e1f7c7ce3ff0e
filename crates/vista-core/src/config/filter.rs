//! Filter specs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;

/// Select value meaning "no filter".
pub const ALL_OPTION: &str = "all";

/// How a filter's value becomes a query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    /// Free text, matched by the data source.
    Search,
    /// One value out of an option list.
    Select,
    /// On/off flag.
    Toggle,
    /// Any number of values out of an option list (OR).
    MultiSelect,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Select => "select",
            Self::Toggle => "toggle",
            Self::MultiSelect => "multiSelect",
        }
    }

    /// Whether this kind needs an option list.
    pub fn needs_options(&self) -> bool {
        matches!(self, Self::Select | Self::MultiSelect)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a select filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A filter shown above a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Query parameter key.
    pub key: String,

    #[serde(rename = "type")]
    pub kind: FilterKind,

    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FilterOption>,
}

impl FilterSpec {
    fn new(key: impl Into<String>, kind: FilterKind, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            label: label.into(),
            placeholder: None,
            options: Vec::new(),
        }
    }

    pub fn search(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, FilterKind::Search, label)
    }

    pub fn select(key: impl Into<String>, label: impl Into<String>, options: Vec<FilterOption>) -> Self {
        Self {
            options,
            ..Self::new(key, FilterKind::Select, label)
        }
    }

    pub fn toggle(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, FilterKind::Toggle, label)
    }

    pub fn multi_select(
        key: impl Into<String>,
        label: impl Into<String>,
        options: Vec<FilterOption>,
    ) -> Self {
        Self {
            options,
            ..Self::new(key, FilterKind::MultiSelect, label)
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Whether `value` is one of the declared options.
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }

    /// Check the spec is well formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key.is_empty() {
            return Err(ConfigError::MissingField {
                config: "FilterSpec",
                field: "key",
            });
        }
        if self.kind.needs_options() && self.options.is_empty() {
            return Err(ConfigError::MissingOptions {
                key: self.key.clone(),
                kind: self.kind.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_without_options_is_rejected() {
        let spec = FilterSpec::select("status", "Status", Vec::new());
        assert_eq!(
            spec.validate(),
            Err(ConfigError::MissingOptions {
                key: "status".to_string(),
                kind: "select".to_string()
            })
        );
    }

    #[test]
    fn test_search_and_toggle_need_no_options() {
        assert!(FilterSpec::search("search", "Search").validate().is_ok());
        assert!(FilterSpec::toggle("isOnHotlist", "Hotlist Only").validate().is_ok());
    }

    #[test]
    fn test_deserialize_filter_spec() {
        let spec: FilterSpec = serde_json::from_str(
            r#"{ "key": "stage", "type": "multiSelect", "label": "Stage",
                 "options": [{ "value": "discovery", "label": "Discovery" }] }"#,
        )
        .unwrap();
        assert_eq!(spec.kind, FilterKind::MultiSelect);
        assert!(spec.has_option("discovery"));
        assert!(!spec.has_option("proposal"));
    }
}

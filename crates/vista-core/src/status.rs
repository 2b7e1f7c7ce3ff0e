//! Status & badge resolution.
//!
//! A status table maps status strings to display metadata. Resolution is a
//! pure lookup; statuses missing from the table resolve to their raw value
//! with the neutral color instead of failing.

use serde::{Deserialize, Serialize};

use crate::config::{FilterOption, ALL_OPTION};

/// Color used for statuses the table does not know.
pub const NEUTRAL_COLOR: &str = "neutral";

/// Display metadata for one status value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Human readable label.
    pub label: String,

    /// Color or semantic class.
    pub color: String,

    /// Icon identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl StatusConfig {
    /// Create a status entry without an icon.
    pub fn new(label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: color.into(),
            icon: None,
        }
    }

    /// Attach an icon.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// The result of resolving a status value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStatus {
    /// The raw status value.
    pub value: String,
    pub label: String,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Whether the table had an entry for the value.
    pub known: bool,
}

/// Lookup table from status value to display metadata.
///
/// Keeps declaration order so that generated filter options follow it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTable {
    entries: Vec<(String, StatusConfig)>,
}

impl StatusTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry (builder style). A repeated status replaces the earlier entry.
    pub fn with(mut self, status: impl Into<String>, config: StatusConfig) -> Self {
        self.insert(status, config);
        self
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, status: impl Into<String>, config: StatusConfig) {
        let status = status.into();
        match self.entries.iter_mut().find(|(s, _)| *s == status) {
            Some(entry) => entry.1 = config,
            None => self.entries.push((status, config)),
        }
    }

    /// Get the entry for a status.
    pub fn get(&self, status: &str) -> Option<&StatusConfig> {
        self.entries
            .iter()
            .find(|(s, _)| s == status)
            .map(|(_, config)| config)
    }

    /// Resolve a status value to display metadata.
    pub fn resolve(&self, status: &str) -> ResolvedStatus {
        match self.get(status) {
            Some(config) => ResolvedStatus {
                value: status.to_string(),
                label: config.label.clone(),
                color: config.color.clone(),
                icon: config.icon.clone(),
                known: true,
            },
            None => ResolvedStatus {
                value: status.to_string(),
                label: status.to_string(),
                color: NEUTRAL_COLOR.to_string(),
                icon: None,
                known: false,
            },
        }
    }

    /// Declared status values, in order.
    pub fn statuses(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    /// Options for a status select filter: "all" followed by every entry.
    pub fn filter_options(&self, all_label: impl Into<String>) -> Vec<FilterOption> {
        std::iter::once(FilterOption::new(ALL_OPTION, all_label))
            .chain(
                self.entries
                    .iter()
                    .map(|(status, config)| FilterOption::new(status.clone(), config.label.clone())),
            )
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Section and journey step specs for detail views.

use serde::{Deserialize, Serialize};

/// A tab or section of a detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSpec {
    pub id: String,
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Show a count badge next to the label.
    #[serde(default)]
    pub show_count: bool,

    /// Renderer key the host resolves to a component.
    pub component: String,
}

impl SectionSpec {
    /// Create a section whose renderer key equals its id.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            component: id.clone(),
            id,
            label: label.into(),
            icon: None,
            show_count: false,
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_count(mut self) -> Self {
        self.show_count = true;
        self
    }

    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }
}

/// A stage in an entity's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyStep {
    pub id: String,
    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Statuses for which this step is in progress.
    #[serde(default)]
    pub active_statuses: Vec<String>,

    /// Statuses for which this step is done.
    #[serde(default)]
    pub completed_statuses: Vec<String>,
}

impl JourneyStep {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            active_statuses: Vec::new(),
            completed_statuses: Vec::new(),
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn active_on(mut self, statuses: &[&str]) -> Self {
        self.active_statuses = statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn completed_on(mut self, statuses: &[&str]) -> Self {
        self.completed_statuses = statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn is_completed_by(&self, status: &str) -> bool {
        self.completed_statuses.iter().any(|s| s == status)
    }

    pub fn is_active_for(&self, status: &str) -> bool {
        self.active_statuses.iter().any(|s| s == status)
    }

    /// Statuses listed as both active and completed.
    pub fn overlapping_statuses(&self) -> Vec<&str> {
        self.active_statuses
            .iter()
            .filter(|s| self.is_completed_by(s))
            .map(String::as_str)
            .collect()
    }
}

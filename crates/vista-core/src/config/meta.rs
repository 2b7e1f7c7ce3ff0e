//! Screen chrome: names, links, stats cards and empty states.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::display_value;

/// Singular and plural display names of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityName {
    pub singular: String,
    pub plural: String,
}

impl EntityName {
    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
        }
    }
}

/// A header button linking somewhere (e.g. "Add Candidate").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAction {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub href: String,
}

impl LinkAction {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            icon: None,
            href: href.into(),
        }
    }
}

/// One crumb in a detail view's breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub label: String,
    pub href: String,
}

impl Breadcrumb {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
        }
    }
}

/// How a stats card formats its number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatFormat {
    #[default]
    Number,
    Percent,
    Currency,
}

/// A summary card above a list, fed by the stats query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsCard {
    /// Key into the stats query result.
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub format: StatFormat,
}

impl StatsCard {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            color: None,
            icon: None,
            format: StatFormat::Number,
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn format(mut self, format: StatFormat) -> Self {
        self.format = format;
        self
    }

    /// Display text for this card given the whole stats result.
    pub fn display(&self, stats: &Value) -> String {
        let value = stats.get(&self.key).cloned().unwrap_or(Value::Null);
        if value.is_null() {
            return display_value(&value);
        }
        match self.format {
            StatFormat::Number => display_value(&value),
            StatFormat::Percent => format!("{}%", display_value(&value)),
            StatFormat::Currency => format!("${}", display_value(&value)),
        }
    }
}

/// What a list shows when the page is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyState {
    pub title: String,

    /// Shown when filters are active.
    pub filtered_description: String,

    /// Shown when the entity has no records at all.
    pub unfiltered_description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<LinkAction>,
}

impl EmptyState {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            filtered_description: "Try adjusting your search or filters".to_string(),
            unfiltered_description: String::new(),
            action: None,
        }
    }

    pub fn unfiltered(mut self, description: impl Into<String>) -> Self {
        self.unfiltered_description = description.into();
        self
    }

    pub fn action(mut self, action: LinkAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn description(&self, filtered: bool) -> &str {
        if filtered {
            &self.filtered_description
        } else {
            &self.unfiltered_description
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stats_card_formats() {
        let stats = json!({ "total": 40, "avgPlacementRate": 12, "pipelineValue": 5000 });
        assert_eq!(StatsCard::new("total", "Total").display(&stats), "40");
        assert_eq!(
            StatsCard::new("avgPlacementRate", "Rate")
                .format(StatFormat::Percent)
                .display(&stats),
            "12%"
        );
        assert_eq!(
            StatsCard::new("pipelineValue", "Value")
                .format(StatFormat::Currency)
                .display(&stats),
            "$5000"
        );
        assert_eq!(
            StatsCard::new("missing", "Missing")
                .format(StatFormat::Percent)
                .display(&stats),
            crate::record::EMPTY_DISPLAY
        );
    }

    #[test]
    fn test_empty_state_description() {
        let empty = EmptyState::new("No candidates found").unfiltered("Add your first candidate");
        assert_eq!(empty.description(true), "Try adjusting your search or filters");
        assert_eq!(empty.description(false), "Add your first candidate");
    }
}

//! Dashboard screens and the configuration document root.
//!
//! A `ScreenConfig` carries no closures, so unlike list and detail configs it
//! can be authored as JSON and loaded with [`ScreenConfig::from_json`].

use serde::{Deserialize, Serialize};

use super::{ensure_unique, DataSourceSpec, DetailViewConfig, ListViewConfig, SectionSpec, StatsCard};
use crate::error::ConfigError;

/// A dashboard built from an aggregate of named queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenConfig {
    pub id: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub data_source: DataSourceSpec,

    /// Aggregate key whose result feeds the stats cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_key: Option<String>,

    #[serde(default)]
    pub stats_cards: Vec<StatsCard>,

    /// Panels; each `component` names the aggregate key it renders.
    #[serde(default)]
    pub sections: Vec<SectionSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_section: Option<String>,
}

impl ScreenConfig {
    pub fn new(id: impl Into<String>, title: impl Into<String>, data_source: DataSourceSpec) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            data_source,
            stats_key: None,
            stats_cards: Vec::new(),
            sections: Vec::new(),
            default_section: None,
        }
    }

    pub fn stats(mut self, key: impl Into<String>, cards: Vec<StatsCard>) -> Self {
        self.stats_key = Some(key.into());
        self.stats_cards = cards;
        self
    }

    pub fn section(mut self, section: SectionSpec) -> Self {
        self.sections.push(section);
        self
    }

    /// Parse and validate a JSON document.
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the document for dangling references.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.is_empty() {
            return Err(ConfigError::MissingField {
                config: "ScreenConfig",
                field: "id",
            });
        }
        if self.title.is_empty() {
            return Err(ConfigError::MissingField {
                config: "ScreenConfig",
                field: "title",
            });
        }

        ensure_unique("section", self.sections.iter().map(|s| s.id.as_str()))?;

        if let Some(default) = &self.default_section {
            if !self.sections.iter().any(|s| &s.id == default) {
                return Err(ConfigError::UnknownDefaultSection(default.clone()));
            }
        }

        if let DataSourceSpec::Aggregate { queries } = &self.data_source {
            let referenced = self
                .stats_key
                .iter()
                .chain(self.sections.iter().map(|s| &s.component));
            for key in referenced {
                if !queries.contains_key(key) {
                    return Err(ConfigError::UnknownField {
                        kind: "aggregate key",
                        key: key.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Section shown first.
    pub fn initial_section(&self) -> Option<&str> {
        self.default_section
            .as_deref()
            .or_else(|| self.sections.first().map(|s| s.id.as_str()))
    }
}

/// Any configuration document the interpreter accepts.
#[derive(Debug)]
pub enum ConfigDocument<R> {
    List(ListViewConfig<R>),
    Detail(DetailViewConfig<R>),
    Screen(ScreenConfig),
}

impl<R> ConfigDocument<R> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::List(_) => "list",
            Self::Detail(_) => "detail",
            Self::Screen(_) => "screen",
        }
    }
}

impl<R> From<ListViewConfig<R>> for ConfigDocument<R> {
    fn from(config: ListViewConfig<R>) -> Self {
        Self::List(config)
    }
}

impl<R> From<DetailViewConfig<R>> for ConfigDocument<R> {
    fn from(config: DetailViewConfig<R>) -> Self {
        Self::Detail(config)
    }
}

impl<R> From<ScreenConfig> for ConfigDocument<R> {
    fn from(config: ScreenConfig) -> Self {
        Self::Screen(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DASHBOARD: &str = r#"{
        "id": "sales",
        "title": "Sales Dashboard",
        "dataSource": {
            "kind": "aggregate",
            "queries": {
                "stats": { "queryKey": "deals.stats" },
                "pipeline": { "queryKey": "deals.pipeline" },
                "recent": { "queryKey": "activities.recent", "params": { "limit": 10 } }
            }
        },
        "statsKey": "stats",
        "statsCards": [
            { "key": "total", "label": "Open Deals" },
            { "key": "winRate", "label": "Win Rate", "format": "percent" }
        ],
        "sections": [
            { "id": "pipeline", "label": "Pipeline", "component": "pipeline" },
            { "id": "recent", "label": "Recent Activity", "component": "recent" }
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let config = ScreenConfig::from_json(DASHBOARD).unwrap();
        assert_eq!(config.stats_cards.len(), 2);
        assert_eq!(config.initial_section(), Some("pipeline"));
    }

    #[test]
    fn test_dangling_section_component_fails() {
        let source = DASHBOARD.replace(r#""component": "recent""#, r#""component": "missing""#);
        let result = ScreenConfig::from_json(&source);
        assert!(matches!(
            result,
            Err(ConfigError::UnknownField { kind: "aggregate key", .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            ScreenConfig::from_json("{ \"id\": "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_title_fails() {
        let config = ScreenConfig::new("x", "", DataSourceSpec::list("deals.list"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { field: "title", .. })
        ));
    }
}

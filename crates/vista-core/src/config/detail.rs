//! Detail view configuration.

use std::fmt;
use std::sync::Arc;

use super::{
    check_columns, ensure_unique, ActionSpec, Breadcrumb, ColumnSpec, DataSourceSpec, JourneyStep, MenuEntry,
    MetricSpec, QueryDescriptor, SectionSpec,
};
use crate::error::ConfigError;
use crate::record::{display_value, Record};
use crate::status::StatusTable;

/// Computes a detail view's title from its record.
pub type TitleFn<R> = Arc<dyn Fn(&R) -> String + Send + Sync>;

/// Configuration of a single-entity detail screen.
pub struct DetailViewConfig<R> {
    pub entity_type: String,
    pub base_route: String,

    /// Dialog bus namespace actions publish to. Defaults to the entity type.
    pub event_namespace: String,

    /// Query fetching the entity itself, called with `{ "id": ... }`.
    pub entity_query: String,

    title: TitleFn<R>,

    pub status_table: StatusTable,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub subtitle_fields: Vec<ColumnSpec<R>>,
    pub metrics: Vec<MetricSpec<R>>,

    pub sections: Vec<SectionSpec>,
    pub default_section: String,

    pub journey: Vec<JourneyStep>,

    pub quick_actions: Vec<ActionSpec<R>>,
    pub menu: Vec<MenuEntry<R>>,

    /// Related data loaded next to the entity.
    pub related: DataSourceSpec,
}

impl<R: Record> DetailViewConfig<R> {
    pub fn builder(entity_type: impl Into<String>) -> DetailViewConfigBuilder<R> {
        DetailViewConfigBuilder::new(entity_type.into())
    }

    /// Header title for `record`.
    pub fn title(&self, record: &R) -> String {
        (self.title)(record)
    }

    pub fn section(&self, id: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn has_section(&self, id: &str) -> bool {
        self.section(id).is_some()
    }
}

impl<R> fmt::Debug for DetailViewConfig<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailViewConfig")
            .field("entity_type", &self.entity_type)
            .field("entity_query", &self.entity_query)
            .field("event_namespace", &self.event_namespace)
            .field("sections", &self.sections.iter().map(|s| &s.id).collect::<Vec<_>>())
            .field("default_section", &self.default_section)
            .field("journey_steps", &self.journey.len())
            .field("quick_actions_count", &self.quick_actions.len())
            .field("menu_count", &self.menu.len())
            .finish()
    }
}

pub struct DetailViewConfigBuilder<R> {
    entity_type: String,
    base_route: Option<String>,
    event_namespace: Option<String>,
    entity_query: Option<String>,
    title: Option<TitleFn<R>>,
    status_table: StatusTable,
    breadcrumbs: Vec<Breadcrumb>,
    subtitle_fields: Vec<ColumnSpec<R>>,
    metrics: Vec<MetricSpec<R>>,
    sections: Vec<SectionSpec>,
    default_section: Option<String>,
    journey: Vec<JourneyStep>,
    quick_actions: Vec<ActionSpec<R>>,
    menu: Vec<MenuEntry<R>>,
    related: Vec<(String, QueryDescriptor)>,
}

impl<R: Record> DetailViewConfigBuilder<R> {
    fn new(entity_type: String) -> Self {
        Self {
            entity_type,
            base_route: None,
            event_namespace: None,
            entity_query: None,
            title: None,
            status_table: StatusTable::new(),
            breadcrumbs: Vec::new(),
            subtitle_fields: Vec::new(),
            metrics: Vec::new(),
            sections: Vec::new(),
            default_section: None,
            journey: Vec::new(),
            quick_actions: Vec::new(),
            menu: Vec::new(),
            related: Vec::new(),
        }
    }

    pub fn base_route(mut self, route: impl Into<String>) -> Self {
        self.base_route = Some(route.into());
        self
    }

    pub fn event_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.event_namespace = Some(namespace.into());
        self
    }

    pub fn entity_query(mut self, key: impl Into<String>) -> Self {
        self.entity_query = Some(key.into());
        self
    }

    /// Compute the title with a closure.
    pub fn title_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&R) -> String + Send + Sync + 'static,
    {
        self.title = Some(Arc::new(f));
        self
    }

    /// Use a single field as the title.
    pub fn title_field(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.title_with(move |record| record.field(&key).map(|v| display_value(&v)).unwrap_or_default())
    }

    pub fn status_table(mut self, table: StatusTable) -> Self {
        self.status_table = table;
        self
    }

    pub fn breadcrumb(mut self, crumb: Breadcrumb) -> Self {
        self.breadcrumbs.push(crumb);
        self
    }

    pub fn subtitle_field(mut self, field: ColumnSpec<R>) -> Self {
        self.subtitle_fields.push(field);
        self
    }

    pub fn metric(mut self, metric: MetricSpec<R>) -> Self {
        self.metrics.push(metric);
        self
    }

    pub fn section(mut self, section: SectionSpec) -> Self {
        self.sections.push(section);
        self
    }

    pub fn default_section(mut self, id: impl Into<String>) -> Self {
        self.default_section = Some(id.into());
        self
    }

    pub fn journey_step(mut self, step: JourneyStep) -> Self {
        self.journey.push(step);
        self
    }

    pub fn quick_action(mut self, action: ActionSpec<R>) -> Self {
        self.quick_actions.push(action);
        self
    }

    pub fn menu_action(mut self, action: ActionSpec<R>) -> Self {
        self.menu.push(MenuEntry::Action(action));
        self
    }

    pub fn menu_separator(mut self) -> Self {
        self.menu.push(MenuEntry::Separator);
        self
    }

    /// Add a related query to the aggregate. `"{id}"` params bind to the entity id.
    pub fn related(mut self, key: impl Into<String>, query: QueryDescriptor) -> Self {
        self.related.push((key.into(), query));
        self
    }

    pub fn build(self) -> Result<DetailViewConfig<R>, ConfigError> {
        const CONFIG: &str = "DetailViewConfig";

        if self.entity_type.is_empty() {
            return Err(ConfigError::MissingField {
                config: CONFIG,
                field: "entity_type",
            });
        }
        let base_route = self.base_route.ok_or(ConfigError::MissingField {
            config: CONFIG,
            field: "base_route",
        })?;
        let entity_query = self.entity_query.ok_or(ConfigError::MissingField {
            config: CONFIG,
            field: "entity_query",
        })?;
        let title = self.title.ok_or(ConfigError::MissingField {
            config: CONFIG,
            field: "title",
        })?;
        if self.sections.is_empty() {
            return Err(ConfigError::MissingField {
                config: CONFIG,
                field: "sections",
            });
        }

        ensure_unique("section", self.sections.iter().map(|s| s.id.as_str()))?;
        ensure_unique("journey step", self.journey.iter().map(|s| s.id.as_str()))?;
        ensure_unique("related query", self.related.iter().map(|(k, _)| k.as_str()))?;
        ensure_unique(
            "action",
            self.quick_actions
                .iter()
                .chain(self.menu.iter().filter_map(MenuEntry::action))
                .map(|a| a.id.as_str()),
        )?;
        check_columns(&self.subtitle_fields)?;

        let default_section = match self.default_section {
            Some(id) if self.sections.iter().any(|s| s.id == id) => id,
            Some(id) => return Err(ConfigError::UnknownDefaultSection(id)),
            // Non-empty checked above.
            None => self.sections[0].id.clone(),
        };

        for step in &self.journey {
            let overlap = step.overlapping_statuses();
            if !overlap.is_empty() {
                tracing::warn!(
                    "Journey step '{}' of '{}' lists {:?} as both active and completed",
                    step.id,
                    self.entity_type,
                    overlap
                );
            }
        }

        let event_namespace = self.event_namespace.unwrap_or_else(|| self.entity_type.clone());

        tracing::debug!(
            "Built detail config '{}' ({} sections, default '{}')",
            self.entity_type,
            self.sections.len(),
            default_section
        );

        Ok(DetailViewConfig {
            entity_type: self.entity_type,
            base_route,
            event_namespace,
            entity_query,
            title,
            status_table: self.status_table,
            breadcrumbs: self.breadcrumbs,
            subtitle_fields: self.subtitle_fields,
            metrics: self.metrics,
            sections: self.sections,
            default_section,
            journey: self.journey,
            quick_actions: self.quick_actions,
            menu: self.menu,
            related: DataSourceSpec::aggregate(self.related),
        })
    }
}

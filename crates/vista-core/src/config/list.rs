//! List view configuration.

use std::fmt;

use super::{
    check_columns, check_filters, ensure_unique, ActionSpec, ColumnSpec, EmptyState, EntityName, FilterSpec,
    LinkAction, SortOrder, StatsCard,
};
use crate::error::ConfigError;
use crate::record::Record;
use crate::status::StatusTable;

/// Page size used when a list does not set one.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Configuration of a paginated, filterable list screen.
pub struct ListViewConfig<R> {
    /// Entity type, e.g. "candidate".
    pub entity_type: String,
    pub entity_name: EntityName,
    /// Route that detail paths hang off.
    pub base_route: String,

    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,

    pub primary_action: Option<LinkAction>,
    pub stats_cards: Vec<StatsCard>,
    /// Query feeding the stats cards.
    pub stats_query: Option<String>,

    pub filters: Vec<FilterSpec>,
    pub columns: Vec<ColumnSpec<R>>,

    pub status_table: StatusTable,

    /// Paginated list query key.
    pub list_query: String,
    pub page_size: usize,
    pub default_sort: Option<(String, SortOrder)>,

    pub empty_state: EmptyState,

    /// Per-row actions.
    pub quick_actions: Vec<ActionSpec<R>>,
}

impl<R: Record> ListViewConfig<R> {
    /// Start building a list configuration for `entity_type`.
    pub fn builder(entity_type: impl Into<String>) -> ListViewConfigBuilder<R> {
        ListViewConfigBuilder::new(entity_type.into())
    }

    pub fn filter(&self, key: &str) -> Option<&FilterSpec> {
        self.filters.iter().find(|f| f.key == key)
    }

    pub fn column(&self, key: &str) -> Option<&ColumnSpec<R>> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Path of a record's detail view.
    pub fn detail_path(&self, record: &R) -> String {
        format!("{}/{}", self.base_route.trim_end_matches('/'), record.id())
    }
}

impl<R> fmt::Debug for ListViewConfig<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListViewConfig")
            .field("entity_type", &self.entity_type)
            .field("title", &self.title)
            .field("list_query", &self.list_query)
            .field("page_size", &self.page_size)
            .field("filters_count", &self.filters.len())
            .field("columns_count", &self.columns.len())
            .field("quick_actions_count", &self.quick_actions.len())
            .finish()
    }
}

/// Builder for [`ListViewConfig`]. `build()` validates the whole document.
pub struct ListViewConfigBuilder<R> {
    entity_type: String,
    entity_name: Option<EntityName>,
    base_route: Option<String>,
    title: Option<String>,
    description: Option<String>,
    icon: Option<String>,
    primary_action: Option<LinkAction>,
    stats_cards: Vec<StatsCard>,
    stats_query: Option<String>,
    filters: Vec<FilterSpec>,
    columns: Vec<ColumnSpec<R>>,
    status_table: StatusTable,
    list_query: Option<String>,
    page_size: usize,
    default_sort: Option<(String, SortOrder)>,
    empty_state: Option<EmptyState>,
    quick_actions: Vec<ActionSpec<R>>,
}

impl<R: Record> ListViewConfigBuilder<R> {
    fn new(entity_type: String) -> Self {
        Self {
            entity_type,
            entity_name: None,
            base_route: None,
            title: None,
            description: None,
            icon: None,
            primary_action: None,
            stats_cards: Vec::new(),
            stats_query: None,
            filters: Vec::new(),
            columns: Vec::new(),
            status_table: StatusTable::new(),
            list_query: None,
            page_size: DEFAULT_PAGE_SIZE,
            default_sort: None,
            empty_state: None,
            quick_actions: Vec::new(),
        }
    }

    pub fn entity_name(mut self, singular: impl Into<String>, plural: impl Into<String>) -> Self {
        self.entity_name = Some(EntityName::new(singular, plural));
        self
    }

    pub fn base_route(mut self, route: impl Into<String>) -> Self {
        self.base_route = Some(route.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn primary_action(mut self, action: LinkAction) -> Self {
        self.primary_action = Some(action);
        self
    }

    pub fn stats_card(mut self, card: StatsCard) -> Self {
        self.stats_cards.push(card);
        self
    }

    pub fn stats_query(mut self, key: impl Into<String>) -> Self {
        self.stats_query = Some(key.into());
        self
    }

    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn column(mut self, column: ColumnSpec<R>) -> Self {
        self.columns.push(column);
        self
    }

    pub fn status_table(mut self, table: StatusTable) -> Self {
        self.status_table = table;
        self
    }

    pub fn list_query(mut self, key: impl Into<String>) -> Self {
        self.list_query = Some(key.into());
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn default_sort(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        self.default_sort = Some((key.into(), order));
        self
    }

    pub fn empty_state(mut self, empty_state: EmptyState) -> Self {
        self.empty_state = Some(empty_state);
        self
    }

    pub fn quick_action(mut self, action: ActionSpec<R>) -> Self {
        self.quick_actions.push(action);
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<ListViewConfig<R>, ConfigError> {
        const CONFIG: &str = "ListViewConfig";

        if self.entity_type.is_empty() {
            return Err(ConfigError::MissingField {
                config: CONFIG,
                field: "entity_type",
            });
        }
        let title = self.title.ok_or(ConfigError::MissingField {
            config: CONFIG,
            field: "title",
        })?;
        let base_route = self.base_route.ok_or(ConfigError::MissingField {
            config: CONFIG,
            field: "base_route",
        })?;
        let list_query = self.list_query.ok_or(ConfigError::MissingField {
            config: CONFIG,
            field: "list_query",
        })?;
        if self.columns.is_empty() {
            return Err(ConfigError::MissingField {
                config: CONFIG,
                field: "columns",
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::MissingField {
                config: CONFIG,
                field: "page_size",
            });
        }

        check_filters(&self.filters)?;
        check_columns(&self.columns)?;
        ensure_unique("action", self.quick_actions.iter().map(|a| a.id.as_str()))?;

        if let Some((key, _)) = &self.default_sort {
            if !self.columns.iter().any(|c| c.key == *key && c.sortable) {
                return Err(ConfigError::UnknownField {
                    kind: "sort key",
                    key: key.clone(),
                });
            }
        }

        let entity_name = self
            .entity_name
            .unwrap_or_else(|| EntityName::new(self.entity_type.clone(), title.clone()));
        let empty_state = self
            .empty_state
            .unwrap_or_else(|| EmptyState::new(format!("No {} found", entity_name.plural.to_lowercase())));

        tracing::debug!(
            "Built list config '{}' ({} columns, {} filters)",
            self.entity_type,
            self.columns.len(),
            self.filters.len()
        );

        Ok(ListViewConfig {
            entity_type: self.entity_type,
            entity_name,
            base_route,
            title,
            description: self.description,
            icon: self.icon,
            primary_action: self.primary_action,
            stats_cards: self.stats_cards,
            stats_query: self.stats_query,
            filters: self.filters,
            columns: self.columns,
            status_table: self.status_table,
            list_query,
            page_size: self.page_size,
            default_sort: self.default_sort,
            empty_state,
            quick_actions: self.quick_actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FilterOption, ALL_OPTION};
    use crate::record::JsonRecord;

    fn base() -> ListViewConfigBuilder<JsonRecord> {
        ListViewConfig::builder("candidate")
            .title("Candidates")
            .base_route("/recruiting/candidates")
            .list_query("candidates.list")
            .column(ColumnSpec::new("title", "Title").sortable())
    }

    #[test]
    fn test_minimal_build() {
        let config = base().build().unwrap();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.entity_name.plural, "Candidates");
        assert_eq!(config.empty_state.title, "No candidates found");
    }

    #[test]
    fn test_missing_list_query_fails() {
        let result = ListViewConfig::<JsonRecord>::builder("candidate")
            .title("Candidates")
            .base_route("/c")
            .column(ColumnSpec::new("title", "Title"))
            .build();
        assert_eq!(
            result.err(),
            Some(ConfigError::MissingField {
                config: "ListViewConfig",
                field: "list_query"
            })
        );
    }

    #[test]
    fn test_select_filter_without_options_fails() {
        let result = base()
            .filter(FilterSpec::select("status", "Status", Vec::new()))
            .build();
        assert!(matches!(result, Err(ConfigError::MissingOptions { .. })));
    }

    #[test]
    fn test_duplicate_filter_key_fails() {
        let options = vec![FilterOption::new(ALL_OPTION, "All")];
        let result = base()
            .filter(FilterSpec::select("status", "Status", options.clone()))
            .filter(FilterSpec::select("status", "Status again", options))
            .build();
        assert!(matches!(result, Err(ConfigError::DuplicateId { kind: "filter", .. })));
    }

    #[test]
    fn test_default_sort_must_be_sortable_column() {
        let result = base().default_sort("created_at", SortOrder::Desc).build();
        assert!(matches!(result, Err(ConfigError::UnknownField { kind: "sort key", .. })));
    }

    #[test]
    fn test_detail_path() {
        let config = base().build().unwrap();
        let record = JsonRecord::from_value(serde_json::json!({ "id": "c1" })).unwrap();
        assert_eq!(config.detail_path(&record), "/recruiting/candidates/c1");
    }
}

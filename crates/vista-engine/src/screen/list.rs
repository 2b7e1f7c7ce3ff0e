//! List screen interpreter.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use vista_core::config::{ListViewConfig, Page, SortOrder};
use vista_core::{ActionError, QueryError, Record, ResolvedStatus};

use super::{action_buttons, ActionButton, Cell};
use crate::dispatch::{ActionDispatcher, ActionOutcome};
use crate::filter::{build_params, has_active_filters, FilterValue, FilterValues, ListParams};
use crate::query::{FetchOutcome, ListQuery, QueryState};

/// One record rendered for a table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRow {
    pub id: String,
    pub detail_path: String,
    pub cells: Vec<Cell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ResolvedStatus>,
    pub actions: Vec<ActionButton>,
}

#[derive(Debug, Clone)]
struct ListState {
    filters: FilterValues,
    sort: Option<(String, SortOrder)>,
    page: usize,
}

/// Interprets a `ListViewConfig`: filters, sort and paging in, rows out.
pub struct ListScreen<R> {
    config: Arc<ListViewConfig<R>>,
    query: Arc<ListQuery<R>>,
    dispatcher: Arc<ActionDispatcher>,
    state: RwLock<ListState>,
}

impl<R> ListScreen<R>
where
    R: Record + DeserializeOwned + Clone,
{
    pub fn new(config: Arc<ListViewConfig<R>>, dispatcher: Arc<ActionDispatcher>) -> Self {
        let query = dispatcher.binder().list(config.list_query.clone());
        let state = ListState {
            filters: FilterValues::new(),
            sort: config.default_sort.clone(),
            page: 0,
        };
        Self {
            config,
            query,
            dispatcher,
            state: RwLock::new(state),
        }
    }

    pub fn config(&self) -> &ListViewConfig<R> {
        &self.config
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Set a filter value. Goes back to the first page.
    pub fn set_filter(&self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let mut state = self.state.write();
        state.filters.set(key, value);
        state.page = 0;
    }

    pub fn clear_filters(&self) {
        let mut state = self.state.write();
        state.filters.clear();
        state.page = 0;
    }

    /// Sort by a column. Goes back to the first page.
    pub fn set_sort(&self, key: impl Into<String>, order: SortOrder) {
        let key = key.into();
        if !self.config.column(&key).is_some_and(|c| c.sortable) {
            tracing::debug!("Column '{}' is not sortable", key);
            return;
        }
        let mut state = self.state.write();
        state.sort = Some((key, order));
        state.page = 0;
    }

    pub fn set_page(&self, page: usize) {
        self.state.write().page = page;
    }

    pub fn page(&self) -> usize {
        self.state.read().page
    }

    pub fn has_active_filters(&self) -> bool {
        has_active_filters(&self.config.filters, &self.state.read().filters)
    }

    /// Params for the current inputs.
    pub fn params(&self) -> ListParams {
        let state = self.state.read();
        let page_size = self.config.page_size;
        let mut params = ListParams::new()
            .with_filters(build_params(&self.config.filters, &state.filters))
            .page(page_size, state.page * page_size);
        if let Some((key, order)) = &state.sort {
            params = params.sort(key.clone(), *order);
        }
        params
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Fetch the page for the current inputs.
    pub async fn refresh(&self) -> FetchOutcome {
        let params = self.params();
        self.query.fetch(params).await
    }

    pub fn state(&self) -> QueryState<Page<R>> {
        self.query.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<Page<R>>> {
        self.query.subscribe()
    }

    pub fn error(&self) -> Option<QueryError> {
        self.query.state().error().cloned()
    }

    /// Render the current page.
    pub fn rows(&self) -> Vec<RenderedRow> {
        match self.query.state() {
            QueryState::Data(page) => page.items.iter().map(|record| self.render_row(record)).collect(),
            _ => Vec::new(),
        }
    }

    fn render_row(&self, record: &R) -> RenderedRow {
        RenderedRow {
            id: record.id().to_string(),
            detail_path: self.config.detail_path(record),
            cells: self
                .config
                .columns
                .iter()
                .map(|column| Cell {
                    key: column.key.clone(),
                    label: column.label.clone(),
                    text: column.display(record),
                })
                .collect(),
            status: record.status().map(|s| self.config.status_table.resolve(s)),
            actions: action_buttons(&self.config.quick_actions, record),
        }
    }

    /// Empty state `(title, description)` when the loaded page has no rows.
    pub fn empty_state(&self) -> Option<(String, String)> {
        let state = self.query.state();
        let page = state.data()?;
        if !page.is_empty() {
            return None;
        }
        let empty = &self.config.empty_state;
        Some((
            empty.title.clone(),
            empty.description(self.has_active_filters()).to_string(),
        ))
    }

    /// Stats card values as `(label, text)`; fetched with the stats query.
    pub async fn stats(&self) -> Result<Vec<(String, String)>, QueryError> {
        let Some(key) = &self.config.stats_query else {
            return Ok(Vec::new());
        };
        let params = serde_json::Value::Object(build_params(&self.config.filters, &self.state.read().filters));
        let stats = self.dispatcher.binder().query(key, params).await?;
        Ok(self
            .config
            .stats_cards
            .iter()
            .map(|card| (card.label.clone(), card.display(&stats)))
            .collect())
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Click quick action `action_id` on row `record_id` of the current page.
    pub async fn run_action(&self, action_id: &str, record_id: &str) -> ActionOutcome {
        let Some(action) = self.config.quick_actions.iter().find(|a| a.id == action_id) else {
            tracing::warn!("Unknown action '{}'", action_id);
            return ActionOutcome::Failed(ActionError::UnknownAction {
                action_id: action_id.to_string(),
            });
        };
        let record = self
            .query
            .state()
            .data()
            .and_then(|page| page.items.iter().find(|r| r.id() == record_id).cloned());
        match record {
            Some(record) => self.dispatcher.dispatch(action, &record).await,
            None => {
                tracing::warn!("Record '{}' is not on the current page", record_id);
                ActionOutcome::Failed(ActionError::NotLoaded {
                    entity_id: record_id.to_string(),
                })
            }
        }
    }
}

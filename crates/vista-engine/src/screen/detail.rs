//! Detail screen interpreter.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;

use vista_core::config::{DataSourceSpec, DetailViewConfig};
use vista_core::{ActionError, QueryError, Record, ResolvedStatus};

use super::{action_buttons, menu_items, ActionButton, Cell, MenuItem};
use crate::bus::DialogHost;
use crate::dispatch::{ActionDispatcher, ActionOutcome};
use crate::navigator::{journey, progress, SectionNavigator, StepState};
use crate::query::{AggregateQuery, AggregateResult, FetchOutcome, QueryState, RecordQuery};

/// Header of a detail screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailHeader {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ResolvedStatus>,
    pub subtitle: Vec<Cell>,
    pub metrics: Vec<Cell>,
}

/// A journey step as the renderer draws it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JourneyView {
    pub id: String,
    pub label: String,
    pub state: StepState,
}

/// Interprets a `DetailViewConfig` for one entity.
///
/// Owns the entity query, the related aggregate, the section navigator and a
/// dialog host on the config's event namespace. Both queries are registered
/// with the binder, so mutations that invalidate their keys refresh the
/// screen. Dropping the screen unsubscribes the host.
pub struct DetailScreen<R> {
    config: Arc<DetailViewConfig<R>>,
    entity_id: String,
    dispatcher: Arc<ActionDispatcher>,
    entity: Arc<RecordQuery<R>>,
    related: Arc<AggregateQuery>,
    sections: SectionNavigator,
    dialogs: DialogHost,
}

impl<R> DetailScreen<R>
where
    R: Record + DeserializeOwned + Clone,
{
    pub fn new(config: Arc<DetailViewConfig<R>>, entity_id: impl Into<String>, dispatcher: Arc<ActionDispatcher>) -> Self {
        let entity_id = entity_id.into();
        let queries = match &config.related {
            DataSourceSpec::Aggregate { queries } => queries.clone(),
            DataSourceSpec::List { query_key } => {
                tracing::warn!("Detail view '{}' has a list data source '{}'", config.entity_type, query_key);
                BTreeMap::new()
            }
        };
        let entity = dispatcher
            .binder()
            .record(config.entity_query.clone(), entity_id.clone());
        let related = dispatcher.binder().aggregate(queries, Some(entity_id.clone()));
        let sections = SectionNavigator::new(config.sections.clone(), &config.default_section);
        let dialogs = DialogHost::attach(dispatcher.bus(), config.event_namespace.clone());

        Self {
            config,
            entity_id,
            dispatcher,
            entity,
            related,
            sections,
            dialogs,
        }
    }

    pub fn config(&self) -> &DetailViewConfig<R> {
        &self.config
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Fetch the entity and its related queries concurrently.
    ///
    /// Returns the entity's own error; related failures stay per key.
    pub async fn load(&self) -> Result<(), QueryError> {
        let (entity, related) = futures::join!(self.entity.fetch(), self.related.fetch());

        if !related.failed().is_empty() {
            tracing::warn!("Related queries failed for '{}': {:?}", self.entity_id, related.failed());
        }

        match entity {
            FetchOutcome::Failed(error) => Err(error),
            FetchOutcome::Applied | FetchOutcome::Stale => Ok(()),
        }
    }

    pub fn record(&self) -> QueryState<R> {
        self.entity.state()
    }

    pub fn subscribe_record(&self) -> watch::Receiver<QueryState<R>> {
        self.entity.subscribe()
    }

    pub fn related(&self) -> AggregateResult {
        self.related.result()
    }

    /// Re-issue a single related query.
    pub async fn retry_related(&self, name: &str) -> bool {
        self.related.refetch_key(name).await
    }

    // =========================================================================
    // View model
    // =========================================================================

    pub fn header(&self) -> Option<DetailHeader> {
        let state = self.entity.state();
        let record = state.data()?;
        Some(DetailHeader {
            title: self.config.title(record),
            status: record.status().map(|s| self.config.status_table.resolve(s)),
            subtitle: self
                .config
                .subtitle_fields
                .iter()
                .map(|field| Cell {
                    key: field.key.clone(),
                    label: field.label.clone(),
                    text: field.display(record),
                })
                .collect(),
            metrics: self
                .config
                .metrics
                .iter()
                .map(|metric| Cell {
                    key: metric.key.clone(),
                    label: metric.label.clone(),
                    text: metric.display(record),
                })
                .collect(),
        })
    }

    /// Journey steps for the record's status, with the number completed.
    pub fn journey(&self) -> Option<(Vec<JourneyView>, usize)> {
        let state = self.entity.state();
        let status = state.data()?.status()?;
        let steps = journey(&self.config.journey, status)
            .into_iter()
            .map(|item| JourneyView {
                id: item.id.to_string(),
                label: item.label.to_string(),
                state: item.state,
            })
            .collect();
        Some((steps, progress(&self.config.journey, status)))
    }

    pub fn sections(&self) -> &SectionNavigator {
        &self.sections
    }

    /// Count badge for a section whose component names a related array query.
    pub fn section_count(&self, section_id: &str) -> Option<usize> {
        let section = self.config.section(section_id)?;
        if !section.show_count {
            return None;
        }
        self.related
            .result()
            .data(&section.component)
            .and_then(|value| value.as_array())
            .map(Vec::len)
    }

    pub fn quick_actions(&self) -> Vec<ActionButton> {
        match self.entity.state().data() {
            Some(record) => action_buttons(&self.config.quick_actions, record),
            None => Vec::new(),
        }
    }

    pub fn menu(&self) -> Vec<MenuItem> {
        match self.entity.state().data() {
            Some(record) => menu_items(&self.config.menu, record),
            None => Vec::new(),
        }
    }

    pub fn dialogs(&self) -> &DialogHost {
        &self.dialogs
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Click a quick or menu action by id.
    pub async fn run_action(&self, action_id: &str) -> ActionOutcome {
        let action = self
            .config
            .quick_actions
            .iter()
            .chain(self.config.menu.iter().filter_map(|entry| entry.action()))
            .find(|a| a.id == action_id);
        let Some(action) = action else {
            tracing::warn!("Unknown action '{}'", action_id);
            return ActionOutcome::Failed(ActionError::UnknownAction {
                action_id: action_id.to_string(),
            });
        };
        let Some(record) = self.entity.state().data().cloned() else {
            tracing::warn!("Action '{}' clicked before '{}' loaded", action_id, self.entity_id);
            return ActionOutcome::Failed(ActionError::NotLoaded {
                entity_id: self.entity_id.clone(),
            });
        };
        self.dispatcher.dispatch(action, &record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{DialogBus, Delivery};
    use crate::memory::InMemorySource;
    use crate::query::QueryBinder;
    use crate::source::RecordingNavigator;
    use serde_json::{json, Value};
    use vista_core::config::{ActionSpec, ColumnSpec, JourneyStep, MetricSpec, QueryDescriptor, SectionSpec};
    use vista_core::{JsonRecord, StatusConfig, StatusTable};

    fn config() -> Arc<DetailViewConfig<JsonRecord>> {
        Arc::new(
            DetailViewConfig::builder("job")
                .base_route("/jobs")
                .entity_query("jobs.get")
                .title_field("title")
                .status_table(StatusTable::new().with("open", StatusConfig::new("Open", "green")))
                .subtitle_field(ColumnSpec::new("client", "Client"))
                .metric(MetricSpec::new("openings", "Openings", |r: &JsonRecord| {
                    r.field("openings").unwrap_or(Value::Null)
                }))
                .section(SectionSpec::new("overview", "Overview"))
                .section(SectionSpec::new("pipeline", "Pipeline").with_count().component("pipeline"))
                .journey_step(JourneyStep::new("draft", "Draft").completed_on(&["open", "filled"]))
                .journey_step(JourneyStep::new("open", "Open").active_on(&["open"]).completed_on(&["filled"]))
                .journey_step(JourneyStep::new("filled", "Filled").active_on(&["filled"]))
                .quick_action(ActionSpec::open_dialog("submit", "Submit Candidate", "job", "submitCandidate"))
                .quick_action(
                    ActionSpec::mutate("fill", "Mark Filled", "jobs.setStatus")
                        .with_param("status", json!("filled"))
                        .invalidating(&["jobs.get"]),
                )
                .menu_action(ActionSpec::navigate("edit", "Edit", "/jobs/{id}/edit"))
                .menu_separator()
                .menu_action(
                    ActionSpec::mutate("close", "Close Job", "jobs.close")
                        .visible_for_statuses(&["filled"]),
                )
                .related("pipeline", QueryDescriptor::new("jobs.pipeline").param("jobId", json!("{id}")))
                .related("activity", QueryDescriptor::new("jobs.activity").param("jobId", json!("{id}")))
                .build()
                .unwrap(),
        )
    }

    fn screen(source: InMemorySource) -> DetailScreen<JsonRecord> {
        let binder = Arc::new(QueryBinder::new(Arc::new(source)));
        let dispatcher = Arc::new(ActionDispatcher::new(
            binder,
            DialogBus::new(),
            Arc::new(RecordingNavigator::new()),
        ));
        DetailScreen::new(config(), "j1", dispatcher)
    }

    fn source() -> InMemorySource {
        InMemorySource::new()
            .with_collection(
                "jobs",
                vec![json!({ "id": "j1", "title": "Staff Engineer", "client": "Acme", "status": "open", "openings": 2 })],
            )
            .get_route("jobs.get", "jobs")
            .status_route("jobs.setStatus", "jobs")
            .value_route("jobs.pipeline", json!([{ "id": "p1" }, { "id": "p2" }]))
            .fail_route("jobs.activity", "activity service down")
    }

    #[tokio::test]
    async fn test_load_renders_header_with_partial_related_failure() {
        let screen = screen(source());
        screen.load().await.unwrap();

        let header = screen.header().unwrap();
        assert_eq!(header.title, "Staff Engineer");
        assert_eq!(header.status.unwrap().label, "Open");
        assert_eq!(header.subtitle[0].text, "Acme");
        assert_eq!(header.metrics[0].text, "2");

        let related = screen.related();
        assert!(related.data("pipeline").is_some());
        assert!(related.error("activity").is_some());
        assert_eq!(screen.section_count("pipeline"), Some(2));
        assert_eq!(screen.section_count("overview"), None);
    }

    #[tokio::test]
    async fn test_journey_and_menu() {
        let screen = screen(source());
        screen.load().await.unwrap();

        let (steps, completed) = screen.journey().unwrap();
        assert_eq!(completed, 1);
        assert_eq!(steps[0].state, StepState::Completed);
        assert_eq!(steps[1].state, StepState::Active);
        assert_eq!(steps[2].state, StepState::Pending);

        // Hidden "close" leaves a trailing separator, which is dropped.
        let menu = screen.menu();
        assert_eq!(menu.len(), 1);
        assert!(matches!(&menu[0], MenuItem::Action(button) if button.id == "edit"));
    }

    #[tokio::test]
    async fn test_dialog_action_opens_host() {
        let screen = screen(source());
        screen.load().await.unwrap();

        let outcome = screen.run_action("submit").await;
        assert_eq!(
            outcome,
            ActionOutcome::DialogRequested {
                namespace: "job".to_string(),
                delivery: Delivery::Delivered(1),
            }
        );
        assert!(screen.dialogs().is_open("submitCandidate"));
        assert_eq!(screen.dialogs().current().unwrap().entity_id, "j1");
    }

    #[tokio::test]
    async fn test_missing_entity_is_an_error() {
        let source = InMemorySource::new()
            .with_collection("jobs", vec![])
            .get_route("jobs.get", "jobs")
            .value_route("jobs.pipeline", json!([]))
            .value_route("jobs.activity", json!([]));
        let screen = screen(source);

        assert!(screen.load().await.is_err());
        assert!(screen.record().is_error());
        assert!(screen.header().is_none());
        assert_eq!(
            screen.run_action("submit").await,
            ActionOutcome::Failed(ActionError::NotLoaded {
                entity_id: "j1".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_mutation_refreshes_entity() {
        let screen = screen(source());
        screen.load().await.unwrap();
        assert_eq!(screen.record().data().and_then(|r| r.status()), Some("open"));

        let outcome = screen.run_action("fill").await;
        assert!(matches!(outcome, ActionOutcome::Mutated { ref key, .. } if key == "jobs.setStatus"));

        assert_eq!(screen.record().data().and_then(|r| r.status()), Some("filled"));
        assert_eq!(screen.header().unwrap().status.unwrap().label, "filled");
        let (_, completed) = screen.journey().unwrap();
        assert_eq!(completed, 2);
    }

    #[tokio::test]
    async fn test_unknown_action_is_an_error() {
        let screen = screen(source());
        screen.load().await.unwrap();
        assert_eq!(
            screen.run_action("archive").await,
            ActionOutcome::Failed(ActionError::UnknownAction {
                action_id: "archive".to_string()
            })
        );
    }
}

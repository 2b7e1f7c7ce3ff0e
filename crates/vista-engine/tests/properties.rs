//! End-to-end behavior of the engine over the in-memory data source.

use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use vista_core::config::{ActionSpec, ColumnSpec, FilterOption, FilterSpec, QueryDescriptor};
use vista_core::{JsonRecord, QueryError, Record, StatusConfig, StatusTable, NEUTRAL_COLOR};
use vista_engine::{
    build_params, visible_actions, ActionDispatcher, Board, ColumnMapping, DialogBus, DropOutcome, FetchOutcome,
    FilterValues, InMemorySource, ListParams, ListQuery, ListScreen, QueryBinder, RecordingNavigator, SettleOutcome,
};

fn statuses() -> StatusTable {
    StatusTable::new()
        .with("active", StatusConfig::new("Active", "green"))
        .with("inactive", StatusConfig::new("Inactive", "gray"))
}

fn record(value: Value) -> JsonRecord {
    JsonRecord::from_value(value).unwrap()
}

// =============================================================================
// Status resolution
// =============================================================================

#[test]
fn status_resolution_is_idempotent() {
    let table = statuses();
    let first = table.resolve("active");
    let second = table.resolve("active");
    assert_eq!(first, second);
    assert_eq!(first.label, "Active");
    assert_eq!(first.color, "green");
}

#[test]
fn unknown_status_falls_back_to_raw_value() {
    let resolved = statuses().resolve("on_hold");
    assert_eq!(resolved.label, "on_hold");
    assert_eq!(resolved.color, NEUTRAL_COLOR);
    assert_eq!(resolved.icon, None);
}

// =============================================================================
// Filter pipeline
// =============================================================================

#[test]
fn select_all_is_omitted_and_options_pass_through() {
    let specs = vec![FilterSpec::select(
        "status",
        "Status",
        vec![
            FilterOption::new("all", "All"),
            FilterOption::new("active", "Active"),
            FilterOption::new("inactive", "Inactive"),
        ],
    )];

    let all = build_params(&specs, &FilterValues::new().with("status", "all"));
    assert!(!all.contains_key("status"));

    let active = build_params(&specs, &FilterValues::new().with("status", "active"));
    assert_eq!(active.get("status"), Some(&json!("active")));
}

// =============================================================================
// Last request wins
// =============================================================================

/// Answers each list request after the delay carried in its `delayMs` filter.
struct DelayedSource;

impl vista_engine::DataSource for DelayedSource {
    fn query(&self, _key: String, params: Value) -> BoxFuture<'static, Result<Value, QueryError>> {
        Box::pin(async move {
            let delay = params["filters"]["delayMs"].as_u64().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(json!({ "items": [{ "id": format!("after-{}", delay) }], "total": 1 }))
        })
    }

    fn mutate(&self, key: String, _params: Value) -> BoxFuture<'static, Result<Value, QueryError>> {
        Box::pin(async move { Err(QueryError::failed(key, "read only")) })
    }
}

#[tokio::test(start_paused = true)]
async fn last_request_wins_under_reordering() {
    let query: ListQuery<JsonRecord> = ListQuery::new("slow.list", Arc::new(DelayedSource), Duration::from_secs(5));

    let first = query.fetch(ListParams::new().filter("delayMs", json!(100)));
    let second = query.fetch(ListParams::new().filter("delayMs", json!(10)));
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first, FetchOutcome::Stale);
    assert_eq!(second, FetchOutcome::Applied);
    let state = query.state();
    let page = state.data().unwrap();
    assert_eq!(page.items[0].id(), "after-10");
}

// =============================================================================
// Action visibility
// =============================================================================

#[test]
fn predicate_hides_action_for_inactive_records() {
    let actions = vec![
        ActionSpec::<JsonRecord>::navigate("view", "View", "/candidates/{id}"),
        ActionSpec::navigate("submit", "Submit", "/candidates/{id}/submit").visible_for_statuses(&["active"]),
    ];

    let inactive = record(json!({ "id": "c1", "status": "inactive" }));
    let ids: Vec<&str> = visible_actions(&actions, &inactive).iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["view"]);

    let active = record(json!({ "id": "c2", "status": "active" }));
    assert_eq!(visible_actions(&actions, &active).len(), 2);
}

// =============================================================================
// Board
// =============================================================================

fn board(source: Arc<InMemorySource>) -> Board<JsonRecord> {
    let mapping = ColumnMapping::builder()
        .column("a", "A", &["status_a"])
        .column("b", "B", &["status_b"])
        .build()
        .unwrap();
    let binder = Arc::new(QueryBinder::new(source));
    let mut board = Board::new(mapping, binder, "deals.updateStatus");
    board.replace_records(vec![record(json!({ "id": "d1", "status": "status_a" }))]);
    board
}

fn deals() -> Arc<InMemorySource> {
    Arc::new(
        InMemorySource::new()
            .with_collection("deals", vec![json!({ "id": "d1", "status": "status_a" })])
            .status_route("deals.updateStatus", "deals"),
    )
}

#[tokio::test]
async fn drag_to_other_column_commits_once() {
    let source = deals();
    let mut board = board(source.clone());

    assert!(board.begin_drag("d1"));
    assert!(board.drag_over("b"));
    let DropOutcome::Commit(commit) = board.drag_end() else {
        panic!("expected a commit");
    };
    assert_eq!(
        board.settle_commit(commit.run().await),
        SettleOutcome::Committed {
            record_id: "d1".to_string(),
            status: "status_b".to_string(),
        }
    );

    assert_eq!(source.call_count("deals.updateStatus"), 1);
    assert_eq!(source.calls()[0].1, json!({ "id": "d1", "status": "status_b" }));
    assert_eq!(source.records("deals")[0]["status"], json!("status_b"));
}

#[test]
fn drag_back_to_origin_commits_nothing() {
    let source = deals();
    let mut board = board(source.clone());

    board.begin_drag("d1");
    board.drag_over("b");
    board.drag_over("a");
    assert!(matches!(board.drag_end(), DropOutcome::Unchanged { .. }));
    assert_eq!(source.call_count("deals.updateStatus"), 0);
}

#[tokio::test]
async fn failed_commit_reverts_the_card() {
    let source = deals();
    source.fail("deals.updateStatus", "conflict");
    let mut board = board(source.clone());

    board.begin_drag("d1");
    board.drag_over("b");
    let DropOutcome::Commit(commit) = board.drag_end() else {
        panic!("expected a commit");
    };
    // Still optimistic until the commit settles.
    assert_eq!(board.record("d1").unwrap().status(), Some("status_b"));
    assert!(matches!(
        board.settle_commit(commit.run().await),
        SettleOutcome::Reverted { .. }
    ));
    assert_eq!(board.record("d1").unwrap().status(), Some("status_a"));
}

// =============================================================================
// Aggregate partial failure
// =============================================================================

#[tokio::test]
async fn aggregate_partial_failure_keeps_successful_keys() {
    let source = Arc::new(
        InMemorySource::new()
            .fail_route("q.a", "boom")
            .value_route("q.b", json!({ "count": 3 })),
    );
    let binder = QueryBinder::new(source.clone());
    let queries = [
        ("a".to_string(), QueryDescriptor::new("q.a")),
        ("b".to_string(), QueryDescriptor::new("q.b")),
    ]
    .into_iter()
    .collect();
    let aggregate = binder.aggregate(queries, None);

    let result = aggregate.fetch().await;
    assert!(result.is_ready());
    assert_eq!(result.data("b"), Some(&json!({ "count": 3 })));
    assert!(result.error("a").is_some());
    assert_eq!(result.failed(), vec!["a"]);
    assert_eq!(source.call_count("q.b"), 1);
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn filtered_list_pages_through_matches() {
    let mut records: Vec<Value> = (0..40)
        .map(|i| json!({ "id": format!("c{:02}", i), "name": format!("Candidate {:02}", i), "status": "active" }))
        .collect();
    records.extend((0..7).map(|i| json!({ "id": format!("x{}", i), "name": "Benched", "status": "inactive" })));

    let source = InMemorySource::new()
        .with_collection("candidates", records)
        .list_route("candidates.list", "candidates", &["name"]);
    let binder = Arc::new(QueryBinder::new(Arc::new(source)));
    let dispatcher = Arc::new(ActionDispatcher::new(
        binder,
        DialogBus::new(),
        Arc::new(RecordingNavigator::new()),
    ));

    let config = vista_core::config::ListViewConfig::<JsonRecord>::builder("candidate")
        .title("Candidates")
        .base_route("/candidates")
        .list_query("candidates.list")
        .filter(FilterSpec::select("status", "Status", statuses().filter_options("All")))
        .column(ColumnSpec::new("name", "Name").sortable())
        .default_sort("name", vista_core::config::SortOrder::Asc)
        .status_table(statuses())
        .build()
        .unwrap();
    let screen = ListScreen::new(Arc::new(config), dispatcher);
    screen.set_filter("status", "active");

    assert_eq!(screen.refresh().await, FetchOutcome::Applied);
    let state = screen.state();
    let first = state.data().unwrap();
    assert_eq!(first.len(), 25);
    assert_eq!(first.total, 40);
    assert!(first.has_more);

    screen.set_page(1);
    screen.refresh().await;
    let state = screen.state();
    let second = state.data().unwrap();
    assert_eq!(second.len(), 15);
    assert!(!second.has_more);
    assert_eq!(second.items[0].id(), "c25");
}

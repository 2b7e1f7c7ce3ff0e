//! Optimistic board engine.
//!
//! A board shows records in columns by status and lets the user drag a card
//! to another column. The move is applied to the local mirror while dragging
//! and committed once, on drop, through the query binder.
//!
//! ## Per-record state machine
//!
//! ```text
//! idle -> pressed -> (moved past threshold) -> dragging
//! dragging -> over column C: local status = column_to_status(C)
//! drop: status unchanged -> idle (no commit)
//!       status changed   -> pending commit
//! settle: success -> committed | failure -> revert
//! ```
//!
//! Dropping never waits on the network. `drag_end` hands back a
//! `PendingCommit`; the host runs it wherever it likes and passes the result
//! to `settle_commit`. The mirror stays readable in between.
//!
//! The mirror belongs to the board alone. Upstream changes replace it
//! wholesale with `replace_records`.

mod mapping;

pub use mapping::{BoardColumn, ColumnMapping, ColumnMappingBuilder};

use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use vista_core::{BoardRecord, EngineSettings, QueryError};

use crate::query::QueryBinder;

const DEFAULT_ACTIVATION_DISTANCE: f32 = 8.0;

/// Result of a drop.
#[derive(Debug)]
pub enum DropOutcome {
    /// No press or drag was in progress.
    Idle,
    /// Released before the activation threshold.
    Click { record_id: String },
    /// Dropped with the status it started with; nothing committed.
    Unchanged { record_id: String },
    /// The status changed; the commit still has to run.
    Commit(PendingCommit),
}

/// A status commit issued by a drop.
///
/// Nothing is sent until `run` is awaited.
pub struct PendingCommit {
    pub record_id: String,
    /// Status before the drag.
    pub from: String,
    pub to: String,
    ticket: u64,
    request: BoxFuture<'static, Result<Value, QueryError>>,
}

impl PendingCommit {
    /// Send the mutation and wait for it.
    pub async fn run(self) -> CommitResult {
        let result = self.request.await;
        CommitResult {
            record_id: self.record_id,
            from: self.from,
            to: self.to,
            ticket: self.ticket,
            result,
        }
    }
}

impl fmt::Debug for PendingCommit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCommit")
            .field("record_id", &self.record_id)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// A finished commit, to be handed to `Board::settle_commit`.
#[derive(Debug, Clone)]
pub struct CommitResult {
    pub record_id: String,
    pub from: String,
    pub to: String,
    ticket: u64,
    pub result: Result<Value, QueryError>,
}

/// What settling a commit did to the mirror.
#[derive(Debug, Clone, PartialEq)]
pub enum SettleOutcome {
    Committed { record_id: String, status: String },
    /// The commit failed and the record went back to `status`.
    Reverted {
        record_id: String,
        status: String,
        error: QueryError,
    },
    /// A newer drop of the same record was issued meanwhile; the mirror is
    /// left to that one.
    Superseded { record_id: String },
}

#[derive(Debug, Clone)]
enum Gesture {
    Idle,
    Pressed {
        record_id: String,
        origin: (f32, f32),
    },
    Dragging(DragSession),
}

#[derive(Debug, Clone)]
struct DragSession {
    record_id: String,
    /// Status before the drag began.
    server_status: String,
    origin_column: String,
}

/// A column with the records currently in it.
#[derive(Debug)]
pub struct ColumnView<'a, R> {
    pub column: &'a BoardColumn,
    pub records: Vec<&'a R>,
}

/// Board over a local mirror of records.
pub struct Board<R> {
    mapping: ColumnMapping,
    binder: Arc<QueryBinder>,
    commit_key: String,
    invalidates: Vec<String>,
    activation_distance: f32,
    records: Vec<R>,
    gesture: Gesture,
    next_ticket: u64,
    /// Latest commit ticket per record.
    in_flight: HashMap<String, u64>,
}

impl<R: BoardRecord> Board<R> {
    /// Commits go to mutation `commit_key` with `{ id, status }`.
    pub fn new(mapping: ColumnMapping, binder: Arc<QueryBinder>, commit_key: impl Into<String>) -> Self {
        Self {
            mapping,
            binder,
            commit_key: commit_key.into(),
            invalidates: Vec::new(),
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            records: Vec::new(),
            gesture: Gesture::Idle,
            next_ticket: 0,
            in_flight: HashMap::new(),
        }
    }

    pub fn with_settings(mut self, settings: &EngineSettings) -> Self {
        self.activation_distance = settings.board.activation_distance;
        self
    }

    pub fn activation_distance(mut self, distance: f32) -> Self {
        self.activation_distance = distance;
        self
    }

    /// Query keys to refresh after a successful commit.
    pub fn invalidating(mut self, keys: &[&str]) -> Self {
        self.invalidates = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    // =========================================================================
    // Mirror
    // =========================================================================

    /// Replace the mirror with a fresh upstream record set.
    ///
    /// Any gesture in progress is abandoned.
    pub fn replace_records(&mut self, records: Vec<R>) {
        if !matches!(self.gesture, Gesture::Idle) {
            tracing::debug!("Records replaced mid-gesture, abandoning it");
            self.gesture = Gesture::Idle;
        }
        tracing::debug!("Board mirror replaced with {} records", records.len());
        self.records = records;
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Columns in order with their visible records.
    pub fn columns(&self) -> Vec<ColumnView<'_, R>> {
        self.mapping
            .columns()
            .iter()
            .map(|column| ColumnView {
                column,
                records: self
                    .records
                    .iter()
                    .filter(|r| {
                        let status = r.status().unwrap_or_default();
                        !self.mapping.is_hidden(status) && self.mapping.status_to_column(status) == column.id
                    })
                    .collect(),
            })
            .collect()
    }

    /// Id of the record being dragged.
    pub fn dragging(&self) -> Option<&str> {
        match &self.gesture {
            Gesture::Dragging(session) => Some(&session.record_id),
            _ => None,
        }
    }

    /// Whether a commit for `record_id` has not settled yet.
    pub fn is_committing(&self, record_id: &str) -> bool {
        self.in_flight.contains_key(record_id)
    }

    fn set_local_status(&mut self, record_id: &str, status: &str) {
        if let Some(record) = self.records.iter_mut().find(|r| r.id() == record_id) {
            record.set_status(status);
        }
    }

    // =========================================================================
    // Gestures
    // =========================================================================

    /// Press on a card. Returns `false` for an unknown record.
    pub fn pointer_down(&mut self, record_id: &str, x: f32, y: f32) -> bool {
        if self.record(record_id).is_none() {
            return false;
        }
        self.gesture = Gesture::Pressed {
            record_id: record_id.to_string(),
            origin: (x, y),
        };
        true
    }

    /// Move the pointer. Returns `true` while a drag is active.
    ///
    /// A press turns into a drag once it travels further than the activation
    /// distance.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        match &self.gesture {
            Gesture::Pressed { record_id, origin } => {
                let distance = (x - origin.0).hypot(y - origin.1);
                if distance > self.activation_distance {
                    let record_id = record_id.clone();
                    self.begin_drag(&record_id)
                } else {
                    false
                }
            }
            Gesture::Dragging(_) => true,
            Gesture::Idle => false,
        }
    }

    /// Start dragging immediately, e.g. from a keyboard shortcut.
    pub fn begin_drag(&mut self, record_id: &str) -> bool {
        let Some(record) = self.record(record_id) else {
            return false;
        };
        let server_status = record.status().unwrap_or_default().to_string();
        let origin_column = self.mapping.status_to_column(&server_status).to_string();

        tracing::debug!("Drag started on '{}' in column '{}'", record_id, origin_column);
        self.gesture = Gesture::Dragging(DragSession {
            record_id: record_id.to_string(),
            server_status,
            origin_column,
        });
        true
    }

    /// The dragged card is over `column`. Updates the local status right away.
    ///
    /// Hovering the origin column restores the original status, so a card
    /// dropped back where it came from never commits.
    pub fn drag_over(&mut self, column: &str) -> bool {
        let Gesture::Dragging(session) = &self.gesture else {
            return false;
        };

        let status = if column == session.origin_column {
            session.server_status.clone()
        } else {
            match self.mapping.column_to_status(column) {
                Some(status) => status.to_string(),
                None => {
                    tracing::debug!("Ignoring drag over unknown column '{}'", column);
                    return false;
                }
            }
        };

        let record_id = session.record_id.clone();
        tracing::debug!("'{}' over '{}', local status '{}'", record_id, column, status);
        self.set_local_status(&record_id, &status);
        true
    }

    /// Abandon the drag and restore the original status.
    pub fn drag_cancel(&mut self) {
        if let Gesture::Dragging(session) = std::mem::replace(&mut self.gesture, Gesture::Idle) {
            tracing::debug!("Drag on '{}' cancelled", session.record_id);
            self.set_local_status(&session.record_id, &session.server_status);
        }
    }

    /// Release the pointer.
    ///
    /// Issues exactly one commit when the status differs from the one the
    /// record had before the drag. The local status keeps the drop until the
    /// commit settles.
    pub fn drag_end(&mut self) -> DropOutcome {
        let session = match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle => return DropOutcome::Idle,
            Gesture::Pressed { record_id, .. } => return DropOutcome::Click { record_id },
            Gesture::Dragging(session) => session,
        };

        let local_status = self
            .record(&session.record_id)
            .and_then(|r| r.status())
            .unwrap_or_default()
            .to_string();

        if local_status == session.server_status {
            tracing::debug!("'{}' dropped with unchanged status", session.record_id);
            return DropOutcome::Unchanged {
                record_id: session.record_id,
            };
        }

        tracing::info!(
            "Committing '{}': '{}' -> '{}'",
            session.record_id,
            session.server_status,
            local_status
        );

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.in_flight.insert(session.record_id.clone(), ticket);

        let binder = self.binder.clone();
        let key = self.commit_key.clone();
        let invalidates = self.invalidates.clone();
        let params = json!({ "id": session.record_id, "status": local_status });

        DropOutcome::Commit(PendingCommit {
            record_id: session.record_id,
            from: session.server_status,
            to: local_status,
            ticket,
            request: Box::pin(async move { binder.mutate(&key, params, &invalidates).await }),
        })
    }

    /// Apply a finished commit to the mirror. A failure reverts the record to
    /// its pre-drag status.
    pub fn settle_commit(&mut self, commit: CommitResult) -> SettleOutcome {
        if self.in_flight.get(&commit.record_id) != Some(&commit.ticket) {
            tracing::debug!("Commit of '{}' superseded by a newer drop", commit.record_id);
            return SettleOutcome::Superseded {
                record_id: commit.record_id,
            };
        }
        self.in_flight.remove(&commit.record_id);

        match commit.result {
            Ok(_) => SettleOutcome::Committed {
                record_id: commit.record_id,
                status: commit.to,
            },
            Err(error) => {
                tracing::warn!(
                    "Commit of '{}' failed, reverting to '{}': {}",
                    commit.record_id,
                    commit.from,
                    error
                );
                self.set_local_status(&commit.record_id, &commit.from);
                SettleOutcome::Reverted {
                    record_id: commit.record_id,
                    status: commit.from,
                    error,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockDataSource;
    use vista_core::{JsonRecord, Record};

    fn mapping() -> ColumnMapping {
        ColumnMapping::builder()
            .column("new", "New", &["new"])
            .column("contacted", "Contacted", &["contacted"])
            .column("qualified", "Qualified", &["qualified", "nurturing"])
            .hidden(&["lost"])
            .build()
            .unwrap()
    }

    fn leads() -> Vec<JsonRecord> {
        ["new", "contacted", "nurturing", "lost"]
            .iter()
            .enumerate()
            .map(|(i, status)| JsonRecord::from_value(json!({ "id": format!("l{}", i), "status": status })).unwrap())
            .collect()
    }

    fn board(source: MockDataSource) -> Board<JsonRecord> {
        let binder = Arc::new(QueryBinder::new(Arc::new(source)));
        let mut board = Board::new(mapping(), binder, "leads.updateStatus");
        board.replace_records(leads());
        board
    }

    #[test]
    fn test_columns_group_and_hide() {
        let board = board(MockDataSource::new());
        let columns = board.columns();
        let counts: Vec<usize> = columns.iter().map(|c| c.records.len()).collect();
        assert_eq!(counts, vec![1, 1, 1]);
    }

    #[test]
    fn test_activation_threshold() {
        let mut board = board(MockDataSource::new());
        assert!(board.pointer_down("l0", 0.0, 0.0));
        assert!(!board.pointer_move(3.0, 4.0));
        assert_eq!(board.dragging(), None);
        assert!(board.pointer_move(6.0, 8.0));
        assert_eq!(board.dragging(), Some("l0"));
    }

    #[test]
    fn test_release_before_threshold_is_click() {
        let mut board = board(MockDataSource::new());
        board.pointer_down("l0", 0.0, 0.0);
        board.pointer_move(1.0, 1.0);
        assert!(matches!(board.drag_end(), DropOutcome::Click { ref record_id } if record_id == "l0"));
    }

    #[tokio::test]
    async fn test_drag_over_updates_mirror_and_commits_once() {
        let mut source = MockDataSource::new();
        source
            .expect_mutate()
            .withf(|key, params| key == "leads.updateStatus" && params == &json!({ "id": "l0", "status": "qualified" }))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(json!({})) }));

        let mut board = board(source);
        board.begin_drag("l0");
        board.drag_over("contacted");
        assert_eq!(board.record("l0").unwrap().status(), Some("contacted"));
        board.drag_over("qualified");
        assert_eq!(board.record("l0").unwrap().status(), Some("qualified"));

        let DropOutcome::Commit(commit) = board.drag_end() else {
            panic!("expected a commit");
        };
        assert_eq!(board.dragging(), None);
        assert_eq!(
            board.settle_commit(commit.run().await),
            SettleOutcome::Committed {
                record_id: "l0".to_string(),
                status: "qualified".to_string()
            }
        );
        assert!(!board.is_committing("l0"));
    }

    #[test]
    fn test_drop_on_origin_column_keeps_lossy_status() {
        // "nurturing" shares a column with "qualified"; hovering elsewhere and
        // coming back must not rewrite it to "qualified".
        let mut board = board(MockDataSource::new());
        board.begin_drag("l2");
        board.drag_over("new");
        board.drag_over("qualified");
        assert_eq!(board.record("l2").unwrap().status(), Some("nurturing"));
        assert!(matches!(board.drag_end(), DropOutcome::Unchanged { ref record_id } if record_id == "l2"));
    }

    #[tokio::test]
    async fn test_failed_commit_reverts() {
        let mut source = MockDataSource::new();
        source
            .expect_mutate()
            .times(1)
            .returning(|key, _| Box::pin(async move { Err(QueryError::failed(key, "conflict")) }));

        let mut board = board(source);
        board.begin_drag("l1");
        board.drag_over("new");
        let DropOutcome::Commit(commit) = board.drag_end() else {
            panic!("expected a commit");
        };
        let outcome = board.settle_commit(commit.run().await);

        assert!(matches!(outcome, SettleOutcome::Reverted { ref status, .. } if status == "contacted"));
        assert_eq!(board.record("l1").unwrap().status(), Some("contacted"));
    }

    #[tokio::test]
    async fn test_mirror_is_readable_while_commit_runs() {
        let mut source = MockDataSource::new();
        source
            .expect_mutate()
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(json!({})) }));

        let mut board = board(source);
        board.begin_drag("l0");
        board.drag_over("contacted");
        let DropOutcome::Commit(commit) = board.drag_end() else {
            panic!("expected a commit");
        };
        let request = tokio::spawn(commit.run());

        // Optimistic state is visible before the commit settles.
        assert!(board.is_committing("l0"));
        let contacted: Vec<&str> = board.columns()[1].records.iter().map(|r| r.id()).collect();
        assert_eq!(contacted, vec!["l0", "l1"]);
        assert!(board.pointer_down("l1", 0.0, 0.0));

        let result = request.await.unwrap();
        assert!(matches!(board.settle_commit(result), SettleOutcome::Committed { .. }));
        assert!(!board.is_committing("l0"));
    }

    #[tokio::test]
    async fn test_stale_failure_does_not_revert_newer_drop() {
        let mut source = MockDataSource::new();
        source
            .expect_mutate()
            .withf(|_, params| params["status"] == json!("contacted"))
            .times(1)
            .returning(|key, _| Box::pin(async move { Err(QueryError::failed(key, "conflict")) }));
        source
            .expect_mutate()
            .withf(|_, params| params["status"] == json!("qualified"))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(json!({})) }));

        let mut board = board(source);
        board.begin_drag("l0");
        board.drag_over("contacted");
        let DropOutcome::Commit(first) = board.drag_end() else {
            panic!("expected a commit");
        };
        board.begin_drag("l0");
        board.drag_over("qualified");
        let DropOutcome::Commit(second) = board.drag_end() else {
            panic!("expected a commit");
        };
        assert_eq!(second.from, "contacted");

        assert_eq!(
            board.settle_commit(first.run().await),
            SettleOutcome::Superseded {
                record_id: "l0".to_string()
            }
        );
        assert_eq!(board.record("l0").unwrap().status(), Some("qualified"));
        assert!(matches!(board.settle_commit(second.run().await), SettleOutcome::Committed { .. }));
    }

    #[test]
    fn test_cancel_reverts_without_commit() {
        let mut board = board(MockDataSource::new());
        board.begin_drag("l0");
        board.drag_over("qualified");
        board.drag_cancel();
        assert_eq!(board.record("l0").unwrap().status(), Some("new"));
        assert_eq!(board.dragging(), None);
    }

    #[test]
    fn test_replace_records_abandons_drag() {
        let mut board = board(MockDataSource::new());
        board.begin_drag("l0");
        board.replace_records(leads());
        assert_eq!(board.dragging(), None);
        assert!(!board.drag_over("qualified"));
    }
}

//! Runtime for the Vista interface engine.
//!
//! This crate turns configuration documents into working screens:
//! - Data source contract and an in-memory implementation
//! - Query binder with last-request-wins lists and per-key aggregates
//! - Filter pipeline from user input to query params
//! - Section and journey navigation
//! - Action dispatch to navigation, mutations or the dialog bus
//! - Namespaced dialog event bus
//! - Optimistic drag-and-drop board
//! - List and detail screen interpreters

pub mod board;
pub mod bus;
pub mod dispatch;
pub mod filter;
pub mod memory;
pub mod navigator;
pub mod query;
pub mod screen;
pub mod source;

// Re-export commonly used types
pub use board::{Board, BoardColumn, ColumnMapping, ColumnView, CommitResult, DropOutcome, PendingCommit, SettleOutcome};
pub use bus::{Delivery, DialogBus, DialogHost, DialogSubscription};
pub use dispatch::{visible_actions, visible_menu, ActionDispatcher, ActionFailure, ActionOutcome};
pub use filter::{build_params, has_active_filters, FilterValue, FilterValues, ListParams};
pub use memory::InMemorySource;
pub use navigator::{journey, progress, step_state, JourneyItem, SectionNavigator, StepState};
pub use query::{AggregateQuery, AggregateResult, FetchOutcome, ListQuery, QueryBinder, QueryState, RecordQuery};
pub use screen::{ActionButton, Cell, DetailHeader, DetailScreen, JourneyView, ListScreen, MenuItem, RenderedRow};
pub use source::{DataSource, LogNavigator, Navigator, RecordingNavigator};

// Re-export vista_core for convenience
pub use vista_core;

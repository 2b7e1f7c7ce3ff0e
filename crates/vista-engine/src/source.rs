//! Collaborator contracts: the data source and the host's navigator.
//!
//! Both traits are transport agnostic and return futures, so the engine can be
//! driven by a network client, a local store or a mock in tests.

use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

use vista_core::QueryError;

// =============================================================================
// DataSource
// =============================================================================

/// Asynchronous query and mutation layer keyed by name.
///
/// A call is either still running (pending), resolved with data, or resolved
/// with an error. List queries resolve to a page object `{ items, total }`.
#[cfg_attr(test, mockall::automock)]
pub trait DataSource: Send + Sync {
    /// Run a read-only query.
    fn query(&self, key: String, params: Value) -> BoxFuture<'static, Result<Value, QueryError>>;

    /// Run a mutation.
    fn mutate(&self, key: String, params: Value) -> BoxFuture<'static, Result<Value, QueryError>>;
}

impl<T: DataSource + ?Sized> DataSource for Arc<T> {
    fn query(&self, key: String, params: Value) -> BoxFuture<'static, Result<Value, QueryError>> {
        (**self).query(key, params)
    }

    fn mutate(&self, key: String, params: Value) -> BoxFuture<'static, Result<Value, QueryError>> {
        (**self).mutate(key, params)
    }
}

// =============================================================================
// Navigator
// =============================================================================

/// Host-supplied navigation.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator that only logs. Useful for headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) {
        tracing::info!("Navigate to {}", path);
    }
}

/// Navigator that records every path it was asked to visit.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: parking_lot::Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.visited.lock().last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        tracing::debug!("Recorded navigation to {}", path);
        self.visited.lock().push(path.to_string());
    }
}

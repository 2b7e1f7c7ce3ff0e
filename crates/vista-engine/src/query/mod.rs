//! Query binder.
//!
//! Turns data source specs into live fetches and exposes their settle state:
//! - `ListQuery` - one paginated list query, last request wins
//! - `AggregateQuery` - named sub-queries fetched concurrently, failures per key
//! - `RecordQuery` - one entity by id, for detail screens
//! - `QueryBinder` - owns the data source, hands out queries and runs mutations
//!   that invalidate them
//!
//! State is broadcast through `tokio::sync::watch`, so every settle is visible
//! to subscribers without polling.

mod aggregate;
mod binder;
mod list;
mod record;

pub use aggregate::{AggregateQuery, AggregateResult};
pub use binder::QueryBinder;
pub use list::ListQuery;
pub use record::RecordQuery;

use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use vista_core::QueryError;

use crate::source::DataSource;

// =============================================================================
// Settle state
// =============================================================================

/// Settle state of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    /// Nothing has settled yet.
    Pending,
    Data(T),
    Error(QueryError),
}

impl<T> QueryState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&QueryError> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }
}

impl<T> From<Result<T, QueryError>> for QueryState<T> {
    fn from(result: Result<T, QueryError>) -> Self {
        match result {
            Ok(data) => Self::Data(data),
            Err(error) => Self::Error(error),
        }
    }
}

/// What happened to the response of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The response is now the query's state.
    Applied,
    /// The response was an error and is now the query's state.
    Failed(QueryError),
    /// A newer fetch was issued meanwhile; the response was dropped.
    Stale,
}

impl FetchOutcome {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }
}

// =============================================================================
// Invalidation
// =============================================================================

/// A live query the binder can re-issue after a mutation.
pub(crate) trait Invalidate: Send + Sync {
    /// Query keys this query depends on.
    fn query_keys(&self) -> Vec<String>;

    /// Re-issue whatever depends on `query_key`.
    fn invalidate<'a>(&'a self, query_key: &'a str) -> BoxFuture<'a, ()>;
}

// =============================================================================
// Timeouts
// =============================================================================

pub(crate) async fn query_with_timeout(
    source: &Arc<dyn DataSource>,
    key: &str,
    params: Value,
    timeout: Duration,
) -> Result<Value, QueryError> {
    match tokio::time::timeout(timeout, source.query(key.to_string(), params)).await {
        Ok(result) => result,
        Err(_) => Err(QueryError::Timeout {
            key: key.to_string(),
            duration: timeout,
        }),
    }
}

pub(crate) async fn mutate_with_timeout(
    source: &Arc<dyn DataSource>,
    key: &str,
    params: Value,
    timeout: Duration,
) -> Result<Value, QueryError> {
    match tokio::time::timeout(timeout, source.mutate(key.to_string(), params)).await {
        Ok(result) => result,
        Err(_) => Err(QueryError::Timeout {
            key: key.to_string(),
            duration: timeout,
        }),
    }
}

//! Paginated list query with last-request-wins ordering.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use vista_core::config::Page;
use vista_core::{QueryError, Record};

use super::{query_with_timeout, FetchOutcome, Invalidate, QueryState};
use crate::filter::ListParams;
use crate::source::DataSource;

#[derive(Debug, Default)]
struct Generations {
    /// Latest fetch issued.
    issued: u64,
    /// Latest fetch whose response was applied.
    settled: u64,
}

/// One list query key.
///
/// Every `fetch` supersedes the ones before it: when an older response
/// resolves after a newer fetch was issued, it is discarded, even if the newer
/// one has not resolved yet.
pub struct ListQuery<R> {
    key: String,
    source: Arc<dyn DataSource>,
    timeout: Duration,
    generations: Mutex<Generations>,
    last_params: Mutex<Option<ListParams>>,
    tx: watch::Sender<QueryState<Page<R>>>,
    rx: watch::Receiver<QueryState<Page<R>>>,
}

impl<R> ListQuery<R>
where
    R: Record + DeserializeOwned + Clone,
{
    pub fn new(key: impl Into<String>, source: Arc<dyn DataSource>, timeout: Duration) -> Self {
        let (tx, rx) = watch::channel(QueryState::Pending);
        Self {
            key: key.into(),
            source,
            timeout,
            generations: Mutex::new(Generations::default()),
            last_params: Mutex::new(None),
            tx,
            rx,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Subscribe to settle state changes.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<Page<R>>> {
        self.rx.clone()
    }

    /// Current settle state.
    pub fn state(&self) -> QueryState<Page<R>> {
        self.rx.borrow().clone()
    }

    /// Whether the latest fetch has not settled yet.
    pub fn is_fetching(&self) -> bool {
        let generations = self.generations.lock();
        generations.issued != generations.settled
    }

    /// Params of the most recent fetch.
    pub fn last_params(&self) -> Option<ListParams> {
        self.last_params.lock().clone()
    }

    /// Fetch a page for `params`.
    pub async fn fetch(&self, params: ListParams) -> FetchOutcome {
        let generation = {
            let mut generations = self.generations.lock();
            generations.issued += 1;
            generations.issued
        };
        *self.last_params.lock() = Some(params.clone());

        tracing::debug!("Fetching '{}' (generation {})", self.key, generation);

        let offset = params.offset;
        let result = query_with_timeout(&self.source, &self.key, params.to_query(), self.timeout)
            .await
            .and_then(|value| decode_page(&self.key, value, offset));

        // Check and publish under the lock so a newer response cannot interleave.
        let mut generations = self.generations.lock();
        if generations.issued != generation {
            tracing::debug!(
                "Discarding stale response for '{}' (generation {}, latest {})",
                self.key,
                generation,
                generations.issued
            );
            return FetchOutcome::Stale;
        }
        generations.settled = generation;

        match result {
            Ok(page) => {
                tracing::debug!("'{}' settled with {} of {} records", self.key, page.len(), page.total);
                self.tx.send_replace(QueryState::Data(page));
                FetchOutcome::Applied
            }
            Err(error) => {
                tracing::warn!("{}", error);
                self.tx.send_replace(QueryState::Error(error.clone()));
                FetchOutcome::Failed(error)
            }
        }
    }

    /// Re-issue the most recent fetch (or a default one).
    pub async fn refetch(&self) -> FetchOutcome {
        let params = self.last_params().unwrap_or_default();
        self.fetch(params).await
    }
}

impl<R> Invalidate for ListQuery<R>
where
    R: Record + DeserializeOwned + Clone,
{
    fn query_keys(&self) -> Vec<String> {
        vec![self.key.clone()]
    }

    fn invalidate<'a>(&'a self, _query_key: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let _ = self.refetch().await;
        })
    }
}

/// Decode a `{ items, total }` response.
fn decode_page<R: DeserializeOwned>(key: &str, value: Value, offset: usize) -> Result<Page<R>, QueryError> {
    let decode_error = |message: String| QueryError::Decode {
        key: key.to_string(),
        message,
    };

    let Value::Object(mut fields) = value else {
        return Err(decode_error("expected an object with items and total".to_string()));
    };
    let items = fields
        .remove("items")
        .ok_or_else(|| decode_error("missing items".to_string()))?;
    let items: Vec<R> = serde_json::from_value(items).map_err(|e| decode_error(e.to_string()))?;
    let total = match fields.get("total").and_then(Value::as_u64) {
        Some(total) => total as usize,
        None => offset + items.len(),
    };

    Ok(Page::new(items, total, offset))
}

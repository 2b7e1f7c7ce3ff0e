//! Single-record query for detail screens.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use vista_core::{QueryError, Record};

use super::{query_with_timeout, FetchOutcome, Invalidate, QueryState};
use crate::source::DataSource;

/// One entity fetched by id with `key`.
///
/// Registered with the binder like list queries, so a mutation that
/// invalidates `key` re-fetches the record. Older responses are dropped once a
/// newer fetch was issued.
pub struct RecordQuery<R> {
    key: String,
    id: String,
    source: Arc<dyn DataSource>,
    timeout: Duration,
    generation: Mutex<u64>,
    tx: watch::Sender<QueryState<R>>,
    rx: watch::Receiver<QueryState<R>>,
}

impl<R> RecordQuery<R>
where
    R: Record + DeserializeOwned + Clone,
{
    pub fn new(key: impl Into<String>, id: impl Into<String>, source: Arc<dyn DataSource>, timeout: Duration) -> Self {
        let (tx, rx) = watch::channel(QueryState::Pending);
        Self {
            key: key.into(),
            id: id.into(),
            source,
            timeout,
            generation: Mutex::new(0),
            tx,
            rx,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<R>> {
        self.rx.clone()
    }

    pub fn state(&self) -> QueryState<R> {
        self.rx.borrow().clone()
    }

    pub async fn fetch(&self) -> FetchOutcome {
        let generation = {
            let mut generation = self.generation.lock();
            *generation += 1;
            *generation
        };

        let result = query_with_timeout(&self.source, &self.key, json!({ "id": self.id }), self.timeout)
            .await
            .and_then(|value| decode_record(&self.key, value));

        let latest = self.generation.lock();
        if *latest != generation {
            tracing::debug!("Discarding stale '{}' for '{}'", self.key, self.id);
            return FetchOutcome::Stale;
        }

        match result {
            Ok(record) => {
                self.tx.send_replace(QueryState::Data(record));
                FetchOutcome::Applied
            }
            Err(error) => {
                tracing::warn!("{}", error);
                self.tx.send_replace(QueryState::Error(error.clone()));
                FetchOutcome::Failed(error)
            }
        }
    }
}

impl<R> Invalidate for RecordQuery<R>
where
    R: Record + DeserializeOwned + Clone,
{
    fn query_keys(&self) -> Vec<String> {
        vec![self.key.clone()]
    }

    fn invalidate<'a>(&'a self, _query_key: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let _ = self.fetch().await;
        })
    }
}

pub(crate) fn decode_record<R: DeserializeOwned>(key: &str, value: Value) -> Result<R, QueryError> {
    serde_json::from_value(value).map_err(|e| QueryError::Decode {
        key: key.to_string(),
        message: e.to_string(),
    })
}

//! The query binder: data source owner and mutation entry point.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use vista_core::config::QueryDescriptor;
use vista_core::{EngineSettings, QueryError, Record};

use super::record::decode_record;
use super::{mutate_with_timeout, query_with_timeout, AggregateQuery, Invalidate, ListQuery, RecordQuery};
use crate::source::DataSource;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Hands out live queries over one data source and runs mutations.
///
/// Queries created through the binder are registered by query key (weakly, so
/// a dropped screen's queries go away with it). A successful mutation
/// re-issues every live query whose key it invalidates.
pub struct QueryBinder {
    source: Arc<dyn DataSource>,
    timeout: Duration,
    live: RwLock<Vec<Weak<dyn Invalidate>>>,
}

impl QueryBinder {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            timeout: DEFAULT_TIMEOUT,
            live: RwLock::new(Vec::new()),
        }
    }

    /// Create with a custom timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_settings(source: Arc<dyn DataSource>, settings: &EngineSettings) -> Self {
        Self::new(source).with_timeout(settings.query.timeout())
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// A list query for `key`, registered for invalidation.
    pub fn list<R>(&self, key: impl Into<String>) -> Arc<ListQuery<R>>
    where
        R: Record + DeserializeOwned + Clone,
    {
        let query = Arc::new(ListQuery::new(key, self.source.clone(), self.timeout));
        self.register(query.clone());
        query
    }

    /// An aggregate over `queries`, registered for invalidation.
    pub fn aggregate(
        &self,
        queries: BTreeMap<String, QueryDescriptor>,
        entity_id: Option<String>,
    ) -> Arc<AggregateQuery> {
        let query = Arc::new(AggregateQuery::new(queries, entity_id, self.source.clone(), self.timeout));
        self.register(query.clone());
        query
    }

    /// A query for the record `id` of `key`, registered for invalidation.
    pub fn record<R>(&self, key: impl Into<String>, id: impl Into<String>) -> Arc<RecordQuery<R>>
    where
        R: Record + DeserializeOwned + Clone,
    {
        let query = Arc::new(RecordQuery::new(key, id, self.source.clone(), self.timeout));
        self.register(query.clone());
        query
    }

    fn register(&self, query: Arc<dyn Invalidate>) {
        let mut live = self.live.write();
        live.retain(|q| q.strong_count() > 0);
        tracing::debug!("Registered query {:?} ({} live)", query.query_keys(), live.len() + 1);
        live.push(Arc::downgrade(&query));
    }

    /// Fetch one record by id with `key`, without registering it.
    pub async fn fetch_record<R>(&self, key: &str, id: &str) -> Result<R, QueryError>
    where
        R: DeserializeOwned,
    {
        let value = query_with_timeout(&self.source, key, json!({ "id": id }), self.timeout).await?;
        decode_record(key, value)
    }

    /// Run a one-off query without registering it.
    pub async fn query(&self, key: &str, params: Value) -> Result<Value, QueryError> {
        query_with_timeout(&self.source, key, params, self.timeout).await
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Run a mutation, then re-issue live queries for `invalidates`.
    ///
    /// Nothing is re-issued when the mutation fails.
    pub async fn mutate(&self, key: &str, params: Value, invalidates: &[String]) -> Result<Value, QueryError> {
        tracing::info!("Running mutation '{}'", key);
        let value = mutate_with_timeout(&self.source, key, params, self.timeout).await?;

        if !invalidates.is_empty() {
            let refreshed = self.invalidate(invalidates).await;
            tracing::debug!("Mutation '{}' refreshed {} queries", key, refreshed);
        }
        Ok(value)
    }

    /// Re-issue every live query depending on one of `keys`.
    ///
    /// Returns the number of queries re-issued.
    pub async fn invalidate(&self, keys: &[String]) -> usize {
        let targets: Vec<(Arc<dyn Invalidate>, String)> = {
            let live = self.live.read();
            live.iter()
                .filter_map(Weak::upgrade)
                .flat_map(|query| {
                    let matching: Vec<String> = query
                        .query_keys()
                        .into_iter()
                        .filter(|k| keys.contains(k))
                        .collect();
                    matching.into_iter().map(move |k| (query.clone(), k))
                })
                .collect()
        };

        let count = targets.len();
        futures::future::join_all(targets.iter().map(|(query, key)| query.invalidate(key))).await;
        count
    }

    /// Number of registered queries still alive.
    pub fn live_queries(&self) -> usize {
        self.live.read().iter().filter(|q| q.strong_count() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ListParams;
    use crate::query::QueryState;
    use crate::source::MockDataSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vista_core::JsonRecord;

    #[tokio::test]
    async fn test_mutation_refreshes_invalidated_queries() {
        let list_calls = Arc::new(AtomicUsize::new(0));
        let counter = list_calls.clone();

        let mut source = MockDataSource::new();
        source.expect_query().returning(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(json!({ "items": [], "total": 0 })) })
        });
        source
            .expect_mutate()
            .withf(|key, params| key == "candidates.archive" && params["id"] == json!("c1"))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(json!({ "ok": true })) }));

        let binder = QueryBinder::new(Arc::new(source));
        let candidates = binder.list::<JsonRecord>("candidates.list");
        let _jobs = binder.list::<JsonRecord>("jobs.list");

        candidates.fetch(ListParams::new()).await;
        assert_eq!(list_calls.load(Ordering::SeqCst), 1);

        binder
            .mutate(
                "candidates.archive",
                json!({ "id": "c1" }),
                &["candidates.list".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_mutation_refreshes_nothing() {
        let mut source = MockDataSource::new();
        source.expect_query().times(1).returning(|_, _| {
            Box::pin(async { Ok(json!({ "items": [{ "id": "c1" }], "total": 1 })) })
        });
        source
            .expect_mutate()
            .returning(|key, _| Box::pin(async move { Err(QueryError::failed(key, "denied")) }));

        let binder = QueryBinder::new(Arc::new(source));
        let candidates = binder.list::<JsonRecord>("candidates.list");
        candidates.fetch(ListParams::new()).await;

        let err = binder
            .mutate("candidates.archive", json!({ "id": "c1" }), &["candidates.list".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.key(), "candidates.archive");
        assert!(matches!(candidates.state(), QueryState::Data(ref page) if page.len() == 1));
    }

    #[tokio::test]
    async fn test_dropped_queries_are_not_refreshed() {
        let source = MockDataSource::new();
        let binder = QueryBinder::new(Arc::new(source));

        let query = binder.list::<JsonRecord>("candidates.list");
        assert_eq!(binder.live_queries(), 1);
        drop(query);
        assert_eq!(binder.live_queries(), 0);
        assert_eq!(binder.invalidate(&["candidates.list".to_string()]).await, 0);
    }

    #[tokio::test]
    async fn test_shared_key_is_refetched_once_per_name() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut source = MockDataSource::new();
        source
            .expect_query()
            .withf(|key, _| key == "activities.list")
            .returning(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::pin(async { Ok(json!([])) })
            });

        let binder = QueryBinder::new(Arc::new(source));
        let aggregate = binder.aggregate(
            BTreeMap::from([
                ("calls".to_string(), QueryDescriptor::new("activities.list").param("kind", json!("call"))),
                ("notes".to_string(), QueryDescriptor::new("activities.list").param("kind", json!("note"))),
            ]),
            None,
        );
        aggregate.fetch().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert_eq!(binder.invalidate(&["activities.list".to_string()]).await, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_mutation_refreshes_record_query() {
        let status = Arc::new(parking_lot::Mutex::new("active"));
        let current = status.clone();

        let mut source = MockDataSource::new();
        source.expect_query().returning(move |_, _| {
            let status = *current.lock();
            Box::pin(async move { Ok(json!({ "id": "c1", "status": status })) })
        });
        let next = status.clone();
        source.expect_mutate().times(1).returning(move |_, _| {
            *next.lock() = "inactive";
            Box::pin(async { Ok(json!({ "ok": true })) })
        });

        let binder = QueryBinder::new(Arc::new(source));
        let record = binder.record::<JsonRecord>("candidates.getById", "c1");
        record.fetch().await;
        assert_eq!(record.state().data().and_then(|r| r.status()), Some("active"));

        binder
            .mutate("candidates.deactivate", json!({ "id": "c1" }), &["candidates.getById".to_string()])
            .await
            .unwrap();
        assert_eq!(record.state().data().and_then(|r| r.status()), Some("inactive"));
    }

    #[tokio::test]
    async fn test_fetch_record() {
        let mut source = MockDataSource::new();
        source
            .expect_query()
            .withf(|key, params| key == "candidates.getById" && params == &json!({ "id": "c1" }))
            .returning(|_, _| Box::pin(async { Ok(json!({ "id": "c1", "status": "active" })) }));

        let binder = QueryBinder::new(Arc::new(source));
        let record: JsonRecord = binder.fetch_record("candidates.getById", "c1").await.unwrap();
        assert_eq!(record.status(), Some("active"));
    }
}

//! Aggregate queries: named sub-queries resolved concurrently.

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use vista_core::config::QueryDescriptor;
use vista_core::QueryError;

use super::{query_with_timeout, Invalidate, QueryState};
use crate::source::DataSource;

/// Per-key settle state of an aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResult {
    entries: BTreeMap<String, QueryState<Value>>,
}

impl AggregateResult {
    fn pending<'a>(names: impl IntoIterator<Item = &'a String>) -> Self {
        Self {
            entries: names
                .into_iter()
                .map(|name| (name.clone(), QueryState::Pending))
                .collect(),
        }
    }

    /// Ready once every sub-query has settled.
    pub fn is_ready(&self) -> bool {
        self.entries.values().all(|state| !state.is_pending())
    }

    pub fn get(&self, name: &str) -> Option<&QueryState<Value>> {
        self.entries.get(name)
    }

    pub fn data(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(QueryState::data)
    }

    pub fn error(&self, name: &str) -> Option<&QueryError> {
        self.get(name).and_then(QueryState::error)
    }

    /// Names of sub-queries that settled with an error.
    pub fn failed(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, state)| state.is_error())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryState<Value>)> {
        self.entries.iter().map(|(name, state)| (name.as_str(), state))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A set of named queries fetched together.
///
/// A failing sub-query never cancels or re-triggers its siblings; its error is
/// recorded under its own name so the screen can render partial data.
pub struct AggregateQuery {
    source: Arc<dyn DataSource>,
    timeout: Duration,
    queries: BTreeMap<String, QueryDescriptor>,
    entity_id: Option<String>,
    generation: Mutex<u64>,
    /// Per-key generations for single-key refetches.
    key_generations: Mutex<BTreeMap<String, u64>>,
    tx: watch::Sender<AggregateResult>,
    rx: watch::Receiver<AggregateResult>,
}

impl AggregateQuery {
    /// `entity_id` replaces `"{id}"` params of every descriptor.
    pub fn new(
        queries: BTreeMap<String, QueryDescriptor>,
        entity_id: Option<String>,
        source: Arc<dyn DataSource>,
        timeout: Duration,
    ) -> Self {
        let (tx, rx) = watch::channel(AggregateResult::pending(queries.keys()));
        Self {
            source,
            timeout,
            queries,
            entity_id,
            generation: Mutex::new(0),
            key_generations: Mutex::new(BTreeMap::new()),
            tx,
            rx,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    pub fn subscribe(&self) -> watch::Receiver<AggregateResult> {
        self.rx.clone()
    }

    pub fn result(&self) -> AggregateResult {
        self.rx.borrow().clone()
    }

    /// Issue every sub-query concurrently and wait until all have settled.
    ///
    /// Each sub-query's state is published as soon as it settles.
    pub async fn fetch(&self) -> AggregateResult {
        let generation = {
            let mut generation = self.generation.lock();
            *generation += 1;
            *generation
        };
        self.tx.send_replace(AggregateResult::pending(self.queries.keys()));

        tracing::debug!(
            "Fetching aggregate of {} queries (generation {})",
            self.queries.len(),
            generation
        );

        let mut in_flight: FuturesUnordered<_> = self
            .queries
            .iter()
            .map(|(name, descriptor)| self.run(name, descriptor))
            .collect();

        while let Some((name, state)) = in_flight.next().await {
            if *self.generation.lock() != generation {
                tracing::debug!("Discarding stale aggregate result for '{}'", name);
                continue;
            }
            self.publish(name, state);
        }

        self.result()
    }

    /// Re-issue a single sub-query, leaving the others untouched.
    ///
    /// Returns `false` for an unknown name.
    pub async fn refetch_key(&self, name: &str) -> bool {
        let Some((name, descriptor)) = self.queries.get_key_value(name) else {
            return false;
        };

        let generation = {
            let mut generations = self.key_generations.lock();
            let generation = generations.entry(name.clone()).or_insert(0);
            *generation += 1;
            *generation
        };
        let aggregate_generation = *self.generation.lock();

        let (name, state) = self.run(name, descriptor).await;

        let latest = self.key_generations.lock().get(&name).copied();
        if latest != Some(generation) || *self.generation.lock() != aggregate_generation {
            tracing::debug!("Discarding stale refetch of '{}'", name);
            return true;
        }
        self.publish(name, state);
        true
    }

    fn run<'a>(
        &'a self,
        name: &'a String,
        descriptor: &'a QueryDescriptor,
    ) -> BoxFuture<'a, (String, QueryState<Value>)> {
        let params = descriptor.bind(self.entity_id.as_deref());
        Box::pin(async move {
            let result = query_with_timeout(&self.source, &descriptor.query_key, params, self.timeout).await;
            if let Err(error) = &result {
                tracing::warn!("Aggregate query '{}' failed: {}", name, error);
            }
            (name.clone(), QueryState::from(result))
        })
    }

    fn publish(&self, name: String, state: QueryState<Value>) {
        self.tx.send_modify(|result| {
            result.entries.insert(name, state);
        });
    }
}

impl Invalidate for AggregateQuery {
    fn query_keys(&self) -> Vec<String> {
        let keys: BTreeSet<&String> = self.queries.values().map(|d| &d.query_key).collect();
        keys.into_iter().cloned().collect()
    }

    fn invalidate<'a>(&'a self, query_key: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let names: Vec<String> = self
                .queries
                .iter()
                .filter(|(_, d)| d.query_key == query_key)
                .map(|(name, _)| name.clone())
                .collect();
            for name in names {
                self.refetch_key(&name).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockDataSource;
    use serde_json::json;

    fn queries() -> BTreeMap<String, QueryDescriptor> {
        BTreeMap::from([
            (
                "activities".to_string(),
                QueryDescriptor::new("activities.list").param("entityId", json!("{id}")),
            ),
            ("submissions".to_string(), QueryDescriptor::new("submissions.list")),
        ])
    }

    #[tokio::test]
    async fn test_partial_failure() {
        let mut source = MockDataSource::new();
        source
            .expect_query()
            .withf(|key, _| key == "activities.list")
            .times(1)
            .returning(|key, _| Box::pin(async move { Err(QueryError::failed(key, "down")) }));
        source
            .expect_query()
            .withf(|key, _| key == "submissions.list")
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(json!([{ "id": "s1" }])) }));

        let aggregate = AggregateQuery::new(queries(), Some("c1".to_string()), Arc::new(source), Duration::from_secs(1));
        assert!(!aggregate.result().is_ready());

        let result = aggregate.fetch().await;
        assert!(result.is_ready());
        assert_eq!(result.failed(), vec!["activities"]);
        assert_eq!(result.data("submissions"), Some(&json!([{ "id": "s1" }])));
    }

    #[tokio::test]
    async fn test_entity_id_is_bound() {
        let mut source = MockDataSource::new();
        source
            .expect_query()
            .withf(|key, params| key == "activities.list" && params["entityId"] == json!("c9"))
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(json!([])) }));
        source
            .expect_query()
            .withf(|key, _| key == "submissions.list")
            .returning(|_, _| Box::pin(async { Ok(json!([])) }));

        let aggregate = AggregateQuery::new(queries(), Some("c9".to_string()), Arc::new(source), Duration::from_secs(1));
        assert!(aggregate.fetch().await.failed().is_empty());
    }

    #[tokio::test]
    async fn test_refetch_key_only_touches_one_query() {
        let mut source = MockDataSource::new();
        source
            .expect_query()
            .withf(|key, _| key == "activities.list")
            .times(2)
            .returning(|_, _| Box::pin(async { Ok(json!(["a"])) }));
        source
            .expect_query()
            .withf(|key, _| key == "submissions.list")
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(json!(["s"])) }));

        let aggregate = AggregateQuery::new(queries(), None, Arc::new(source), Duration::from_secs(1));
        aggregate.fetch().await;
        assert!(aggregate.refetch_key("activities").await);
        assert!(!aggregate.refetch_key("unknown").await);
    }
}

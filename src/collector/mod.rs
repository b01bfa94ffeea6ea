//! Metric collection: property resolution, transforms, and the concurrent
//! per-pool collection pass.
//!
//! A [`PoolCollector`] owns one query kind and the list of raw property keys
//! it advertises. A collection pass spawns one independent task per pool —
//! unbounded fan-out, since the number of pools on a host is bounded by its
//! physical storage configuration, not by request rate — and waits for all
//! of them before returning. Per pool the pass runs command → line handler →
//! property map → registry lookup → transform → metric emission.
//!
//! # Failure policy
//!
//! - An unregistered property key is logged and skipped; the rest of the
//!   pool continues. One renamed property in a new `zpool` release must not
//!   blank out a whole pool.
//! - A command failure or transform failure is fatal for that pool only.
//! - The pass aggregates every per-pool failure into one [`CollectError`];
//!   metrics already emitted by successful pools stay delivered.

mod error;
pub mod property;
pub mod transform;

pub use error::{CollectError, PoolError};
pub use property::{pool_registry, Property, PropertyNotFound, PropertyRegistry, POOL_LABELS};
pub use transform::{Transform, TransformError};

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::metrics::Metric;
use crate::zpool::{Client, PoolKind};

/// Properties queried by the default `zpool get` collector.
pub const DEFAULT_POOL_PROPERTIES: &[&str] = &[
    "allocated",
    "dedupratio",
    "fragmentation",
    "free",
    "freeing",
    "health",
    "leaked",
    "readonly",
    "size",
];

/// Keys advertised by the default `zpool iostat` collector.
pub const DEFAULT_POOL_IOSTATS: &[&str] = &["opread", "opwrite", "bwread", "bwwrite"];

/// Collects one kind of pool metrics across many pools concurrently.
#[derive(Debug)]
pub struct PoolCollector<C: Client> {
    kind: PoolKind,
    client: C,
    registry: Arc<PropertyRegistry>,
    props: Arc<[String]>,
}

impl<C: Client> Clone for PoolCollector<C> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            client: self.client.clone(),
            registry: Arc::clone(&self.registry),
            props: Arc::clone(&self.props),
        }
    }
}

impl<C: Client> PoolCollector<C> {
    /// Creates a collector for `kind` advertising the given property keys.
    ///
    /// Configured keys that the registry does not know are warned about
    /// here, once, rather than on every scrape.
    pub fn new(
        kind: PoolKind,
        client: C,
        registry: Arc<PropertyRegistry>,
        props: Vec<String>,
    ) -> Self {
        for key in &props {
            if let Err(err) = registry.find(key) {
                log::warn!("ignoring unsupported property: kind={kind} property={key} err={err}");
            }
        }
        Self {
            kind,
            client,
            registry,
            props: props.into(),
        }
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    /// Runs one collection pass over `pools`, emitting metrics on `tx`.
    ///
    /// One task per pool, fully parallel; the pass waits for every task.
    /// The error channel is sized to the pool count so a failing task can
    /// always hand off its error without blocking against this method
    /// waiting for completion.
    pub async fn collect(
        &self,
        pools: &[String],
        tx: mpsc::Sender<Metric>,
    ) -> Result<(), CollectError> {
        if pools.is_empty() {
            return Ok(());
        }

        let (err_tx, mut err_rx) = mpsc::channel::<PoolError>(pools.len());
        let mut tasks = Vec::with_capacity(pools.len());
        for pool in pools {
            let collector = self.clone();
            let pool = pool.clone();
            let tx = tx.clone();
            let err_tx = err_tx.clone();
            tasks.push(tokio::spawn(async move {
                if let Err(err) = collector.collect_pool(&pool, &tx).await {
                    let _ = err_tx.send(err).await;
                }
            }));
        }
        drop(tx);
        drop(err_tx);

        for task in tasks {
            task.await.expect("collection task panicked");
        }

        let mut errors = Vec::new();
        while let Some(err) = err_rx.recv().await {
            errors.push(err);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CollectError::new(errors))
        }
    }

    /// Collects, resolves and emits the metrics of a single pool.
    async fn collect_pool(&self, pool: &str, tx: &mpsc::Sender<Metric>) -> Result<(), PoolError> {
        let properties = self
            .client
            .pool_properties(pool, self.kind, &self.props)
            .await
            .map_err(|source| PoolError::Command {
                pool: pool.to_owned(),
                source,
            })?;

        let label_values = vec![pool.to_owned()];
        for (key, value) in &properties {
            let property = match self.registry.find(key) {
                Ok(property) => property,
                Err(err) => {
                    log::warn!(
                        "skipping unsupported property: kind={} pool={pool} property={key} err={err}",
                        self.kind
                    );
                    continue;
                }
            };
            let metric = property
                .metric(value, label_values.clone())
                .map_err(|source| PoolError::Transform {
                    pool: pool.to_owned(),
                    property: key.clone(),
                    source,
                })?;
            if tx.send(metric).await.is_err() {
                // Receiver gone; the pass result is no longer observable.
                return Ok(());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::zpool::{PropertyMap, ZpoolError};

    #[derive(Debug, Clone, Default)]
    struct FakeClient {
        pools: HashMap<String, PropertyMap>,
        failing: HashSet<String>,
    }

    impl FakeClient {
        fn with_pool(mut self, pool: &str, props: &[(&str, &str)]) -> Self {
            let props = props
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect();
            self.pools.insert(pool.to_owned(), props);
            self
        }

        fn with_failing(mut self, pool: &str) -> Self {
            self.failing.insert(pool.to_owned());
            self
        }
    }

    impl Client for FakeClient {
        async fn pool_properties(
            &self,
            pool: &str,
            _kind: PoolKind,
            _props: &[String],
        ) -> Result<PropertyMap, ZpoolError> {
            if self.failing.contains(pool) {
                return Err(ZpoolError::Exit {
                    program: "zpool".to_owned(),
                    code: Some(1),
                });
            }
            Ok(self.pools.get(pool).cloned().unwrap_or_default())
        }

        async fn pool_names(&self) -> Result<Vec<String>, ZpoolError> {
            let mut names: Vec<String> = self.pools.keys().cloned().collect();
            names.sort();
            Ok(names)
        }
    }

    fn collector(client: FakeClient, props: &[&str]) -> PoolCollector<FakeClient> {
        PoolCollector::new(
            PoolKind::Properties,
            client,
            Arc::new(pool_registry()),
            props.iter().map(|p| (*p).to_owned()).collect(),
        )
    }

    async fn run_pass(
        collector: &PoolCollector<FakeClient>,
        pools: &[&str],
    ) -> (Vec<Metric>, Result<(), CollectError>) {
        let pools: Vec<String> = pools.iter().map(|p| (*p).to_owned()).collect();
        let (tx, mut rx) = mpsc::channel(64);
        let result = collector.collect(&pools, tx).await;
        let mut metrics = Vec::new();
        while let Some(metric) = rx.recv().await {
            metrics.push(metric);
        }
        (metrics, result)
    }

    #[tokio::test]
    async fn test_collect_emits_metrics_for_all_pools() {
        let client = FakeClient::default()
            .with_pool("tank", &[("size", "1024"), ("health", "ONLINE")])
            .with_pool("backup", &[("size", "2048"), ("health", "DEGRADED")]);
        let collector = collector(client, &["size", "health"]);

        let (metrics, result) = run_pass(&collector, &["tank", "backup"]).await;
        result.unwrap();
        assert_eq!(metrics.len(), 4);

        let health = |pool: &str| {
            metrics
                .iter()
                .find(|m| m.name() == "health" && m.label_values() == [pool])
                .map(Metric::value)
        };
        assert_eq!(health("tank"), Some(0.0));
        assert_eq!(health("backup"), Some(1.0));
    }

    #[tokio::test]
    async fn test_empty_pool_list_completes_without_metrics() {
        let collector = collector(FakeClient::default(), &["size"]);
        let (metrics, result) = run_pass(&collector, &[]).await;
        result.unwrap();
        assert!(metrics.is_empty());
    }

    #[tokio::test]
    async fn test_failing_pool_keeps_other_pools_delivered() {
        let client = FakeClient::default()
            .with_pool("a", &[("size", "1")])
            .with_pool("c", &[("size", "3")])
            .with_failing("b");
        let collector = collector(client, &["size"]);

        let (metrics, result) = run_pass(&collector, &["a", "b", "c"]).await;
        let err = result.unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].pool(), "b");
        assert!(matches!(err.errors()[0], PoolError::Command { .. }));

        let mut delivered: Vec<&str> = metrics
            .iter()
            .map(|m| m.label_values()[0].as_str())
            .collect();
        delivered.sort_unstable();
        assert_eq!(delivered, ["a", "c"]);
    }

    #[tokio::test]
    async fn test_all_failures_are_aggregated() {
        let client = FakeClient::default().with_failing("a").with_failing("b");
        let collector = collector(client, &["size"]);

        let (_, result) = run_pass(&collector, &["a", "b"]).await;
        let err = result.unwrap_err();
        let mut failed: Vec<&str> = err.errors().iter().map(PoolError::pool).collect();
        failed.sort_unstable();
        assert_eq!(failed, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_unresolved_property_is_skipped_not_fatal() {
        let client =
            FakeClient::default().with_pool("tank", &[("size", "1024"), ("guid", "12345")]);
        let collector = collector(client, &["size"]);

        let (metrics, result) = run_pass(&collector, &["tank"]).await;
        result.unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].name(), "size_bytes");
    }

    #[tokio::test]
    async fn test_transform_failure_is_pool_fatal() {
        let client = FakeClient::default().with_pool("tank", &[("health", "RESILVERING")]);
        let collector = collector(client, &["health"]);

        let (_, result) = run_pass(&collector, &["tank"]).await;
        let err = result.unwrap_err();
        assert!(matches!(
            err.errors()[0],
            PoolError::Transform { ref property, .. } if property == "health"
        ));
    }
}

use std::sync::Arc;

/// zpool exporter: collects ZFS pool metrics by invoking the `zpool`
/// management command and republishes them as labeled Prometheus gauges.
///
/// This library provides the collection pipeline — command execution,
/// line-oriented output validation, property resolution with typed value
/// transforms, and concurrent per-pool collection — plus the HTTP server
/// that exposes the result on `/metrics`.
pub mod api;
pub mod collector;
pub mod error;
pub mod metrics;
pub mod zpool;

use collector::PoolCollector;
use zpool::{PoolKind, ZpoolClient};

const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:9134";

/// Reads a comma-separated property list from the environment, falling back
/// to the built-in default.
fn env_properties(var: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(var) {
        Ok(value) => value
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect(),
        Err(_) => default.iter().map(|p| (*p).to_owned()).collect(),
    }
}

/// Runs the zpool exporter.
///
/// Builds the property registry and the default collectors (pool properties
/// and pool I/O statistics), then serves `/metrics` until the process is
/// terminated. Every scrape runs a fresh collection pass; nothing is cached
/// between scrapes.
///
/// # Configuration
///
/// - `LISTEN_ADDRESS` — bind address for the HTTP server (default
///   `0.0.0.0:9134`).
/// - `ZPOOL_PROPERTIES` — comma-separated pool properties to query.
/// - `ZPOOL_IOSTATS` — comma-separated I/O statistic keys to advertise.
///
/// # Errors
///
/// Returns an error if the listen address is unusable; collection failures
/// at scrape time are logged, not fatal.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let listen_address =
        std::env::var("LISTEN_ADDRESS").unwrap_or_else(|_| DEFAULT_LISTEN_ADDRESS.to_owned());
    let pool_props = env_properties("ZPOOL_PROPERTIES", collector::DEFAULT_POOL_PROPERTIES);
    let iostat_props = env_properties("ZPOOL_IOSTATS", collector::DEFAULT_POOL_IOSTATS);

    let registry = Arc::new(collector::pool_registry());
    let client = ZpoolClient;
    let collectors = vec![
        PoolCollector::new(
            PoolKind::Properties,
            client,
            Arc::clone(&registry),
            pool_props,
        ),
        PoolCollector::new(PoolKind::Iostat, client, Arc::clone(&registry), iostat_props),
    ];

    let exporter = Arc::new(api::Exporter::new(client, collectors));
    log::info!("listening on {listen_address}");
    api::ApiServer::new(exporter).await.listen(listen_address).await;
    Ok(())
}

//! Property descriptors and the registry that resolves raw keys to them.
//!
//! A [`Property`] binds one raw `zpool` key to the metric it is exported as:
//! subsystem, metric name, help text, ordered label names and the value
//! transform. The [`PropertyRegistry`] is built once at startup, shared
//! read-only into every collector, and never mutated afterwards, so
//! collection passes need no synchronization around it.
//!
//! Several raw keys may alias to the same metric name; the reverse never
//! holds — each raw key resolves to at most one descriptor.

use std::collections::HashMap;

use thiserror::Error;

use crate::metrics::Metric;
use crate::zpool::PoolStatus;

use super::transform::{self, Transform, TransformError};

/// Label names applied to every pool metric.
pub const POOL_LABELS: &[&str] = &["pool"];

const SUBSYSTEM_POOL: &str = "pool";

/// The key is not registered; the pair is skipped, not fatal.
#[derive(Debug, Error)]
#[error("unsupported property '{0}'")]
pub struct PropertyNotFound(pub String);

/// Immutable metadata binding a raw property key to an exported metric.
#[derive(Debug, Clone)]
pub struct Property {
    subsystem: &'static str,
    name: &'static str,
    help: String,
    labels: &'static [&'static str],
    transform: Transform,
}

impl Property {
    fn new(
        subsystem: &'static str,
        name: &'static str,
        help: impl Into<String>,
        transform: Transform,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            subsystem,
            name,
            help: help.into(),
            labels,
            transform,
        }
    }

    pub fn subsystem(&self) -> &'static str {
        self.subsystem
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    /// Applies the descriptor's transform to a raw value.
    pub fn transform(&self, value: &str) -> Result<f64, TransformError> {
        (self.transform)(value)
    }

    /// Transforms `value` and binds it into an emission-ready [`Metric`].
    pub fn metric(&self, value: &str, label_values: Vec<String>) -> Result<Metric, TransformError> {
        let value = self.transform(value)?;
        Ok(Metric::new(
            self.subsystem,
            self.name,
            self.help.clone(),
            self.labels,
            label_values,
            value,
        ))
    }
}

/// Exact-match lookup from raw property key to descriptor.
///
/// Populated once at startup; read-only during collection.
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    store: HashMap<&'static str, Property>,
}

impl PropertyRegistry {
    /// Registers a descriptor under a raw key. Startup only.
    pub fn register(&mut self, key: &'static str, property: Property) {
        self.store.insert(key, property);
    }

    /// Resolves a raw key to its descriptor.
    pub fn find(&self, key: &str) -> Result<&Property, PropertyNotFound> {
        self.store.get(key).ok_or_else(|| PropertyNotFound(key.to_owned()))
    }
}

fn health_help() -> String {
    let states = [
        PoolStatus::Online,
        PoolStatus::Degraded,
        PoolStatus::Faulted,
        PoolStatus::Offline,
        PoolStatus::Unavail,
        PoolStatus::Removed,
        PoolStatus::Suspended,
    ];
    let codes = states
        .iter()
        .map(|s| format!("{}: {}", s.code(), s))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Health status code for the pool [{codes}].")
}

/// Builds the registry of all supported pool properties.
pub fn pool_registry() -> PropertyRegistry {
    let mut registry = PropertyRegistry::default();
    let mut pool = |key: &'static str, name: &'static str, help: String, transform: Transform| {
        registry.register(
            key,
            Property::new(SUBSYSTEM_POOL, name, help, transform, POOL_LABELS),
        );
    };

    pool(
        "allocated",
        "allocated_bytes",
        "Amount of storage in bytes used within the pool.".into(),
        transform::numeric,
    );
    pool(
        "capacity",
        "capacity_ratio",
        "Ratio of pool space used.".into(),
        transform::percentage,
    );
    pool(
        "dedupratio",
        "deduplication_ratio",
        "The ratio of deduplicated size vs undeduplicated size for data in this pool.".into(),
        transform::multiplier,
    );
    pool(
        "expandsize",
        "expand_size_bytes",
        "Amount of uninitialized space within the pool or device that can be used to increase the total capacity of the pool.".into(),
        transform::numeric,
    );
    pool(
        "fragmentation",
        "fragmentation_ratio",
        "The fragmentation ratio of the pool.".into(),
        transform::percentage,
    );
    pool(
        "free",
        "free_bytes",
        "The amount of free space in bytes available in the pool.".into(),
        transform::numeric,
    );
    pool(
        "freeing",
        "freeing_bytes",
        "The amount of space in bytes remaining to be freed following the destruction of a file system or snapshot.".into(),
        transform::numeric,
    );
    pool("health", "health", health_help(), transform::health_code);
    pool(
        "leaked",
        "leaked_bytes",
        "Number of leaked bytes in the pool.".into(),
        transform::numeric,
    );
    pool(
        "readonly",
        "readonly",
        "Read-only status of the pool [0: read-write, 1: read-only].".into(),
        transform::bool_on_off,
    );
    pool(
        "size",
        "size_bytes",
        "Total size in bytes of the storage pool.".into(),
        transform::numeric,
    );
    pool(
        "opread",
        "operations_read",
        "Displays logical I/O statistics for the given pools, Read IOPS".into(),
        transform::numeric,
    );
    pool(
        "opwrite",
        "operations_write",
        "Displays logical I/O statistics for the given pools, Write IOPS".into(),
        transform::numeric,
    );
    pool(
        "bwread",
        "bandwidth_read",
        "Displays logical I/O statistics for the given pools, Read Bandwidth".into(),
        transform::numeric,
    );
    pool(
        "bwwrite",
        "bandwidth_write",
        "Displays logical I/O statistics for the given pools, Write Bandwidth".into(),
        transform::numeric,
    );

    registry
}

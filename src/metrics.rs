//! Emission-ready metrics and their Prometheus text exposition.
//!
//! A [`Metric`] is the end product of one property's journey through a
//! collection pass: the descriptor metadata plus the transformed value and
//! the label values bound in the same order as the descriptor's label names.
//! Metrics live for one pass only; nothing is cached between scrapes, so
//! [`encode`] builds a fresh prometheus registry every time and stale label
//! sets from vanished pools disappear on their own.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

/// Namespace prefix of every exported metric.
pub const NAMESPACE: &str = "zfs";

/// One transformed, labeled metric value.
#[derive(Debug, Clone)]
pub struct Metric {
    subsystem: &'static str,
    name: &'static str,
    help: String,
    label_names: &'static [&'static str],
    label_values: Vec<String>,
    value: f64,
}

impl Metric {
    pub fn new(
        subsystem: &'static str,
        name: &'static str,
        help: String,
        label_names: &'static [&'static str],
        label_values: Vec<String>,
        value: f64,
    ) -> Self {
        Self {
            subsystem,
            name,
            help,
            label_names,
            label_values,
            value,
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

    pub fn label_names(&self) -> &'static [&'static str] {
        self.label_names
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Renders a pass's metrics in the Prometheus text exposition format.
///
/// One gauge family per distinct metric name; aliased raw keys that resolved
/// to the same name land in the same family.
pub fn encode(metrics: &[Metric]) -> Result<String, prometheus::Error> {
    let registry = Registry::new();
    let mut families: HashMap<&'static str, GaugeVec> = HashMap::new();

    for metric in metrics {
        let family = match families.entry(metric.name()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let opts = Opts::new(metric.name(), metric.help())
                    .namespace(NAMESPACE)
                    .subsystem(metric.subsystem());
                let family = GaugeVec::new(opts, metric.label_names())?;
                registry.register(Box::new(family.clone()))?;
                entry.insert(family)
            }
        };
        let values: Vec<&str> = metric.label_values().iter().map(String::as_str).collect();
        family.with_label_values(&values).set(metric.value());
    }

    let mut buf = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buf)?;
    String::from_utf8(buf).map_err(|_| prometheus::Error::Msg("exposition is not UTF-8".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(name: &'static str, pool: &str, value: f64) -> Metric {
        Metric::new(
            "pool",
            name,
            format!("{name} help"),
            &["pool"],
            vec![pool.to_owned()],
            value,
        )
    }

    #[test]
    fn test_encode_renders_fully_qualified_names() {
        let body = encode(&[metric("size_bytes", "tank", 1024.0)]).unwrap();
        assert!(body.contains("# HELP zfs_pool_size_bytes size_bytes help"));
        assert!(body.contains("# TYPE zfs_pool_size_bytes gauge"));
        assert!(body.contains("zfs_pool_size_bytes{pool=\"tank\"} 1024"));
    }

    #[test]
    fn test_encode_groups_pools_into_one_family() {
        let body = encode(&[
            metric("size_bytes", "tank", 1024.0),
            metric("size_bytes", "backup", 2048.0),
        ])
        .unwrap();
        assert_eq!(body.matches("# TYPE zfs_pool_size_bytes gauge").count(), 1);
        assert!(body.contains("zfs_pool_size_bytes{pool=\"backup\"} 2048"));
        assert!(body.contains("zfs_pool_size_bytes{pool=\"tank\"} 1024"));
    }

    #[test]
    fn test_encode_empty_pass_is_empty() {
        assert_eq!(encode(&[]).unwrap(), "");
    }
}

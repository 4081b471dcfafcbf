//! Plain-data view of a registry, carried by events and reports

use serde::{Deserialize, Serialize};

use super::super::metric::MetricSnapshot;

/// One metric with its identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub algorithm: String,
    pub dataset_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    pub metric: MetricSnapshot,
}

/// Serializable copy of a [`MetricRegistry`](super::MetricRegistry)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub entries: Vec<RegistryEntry>,
}

impl RegistrySnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for (metric name, algorithm, dataset id)
    pub fn find(&self, name: &str, algorithm: &str, dataset_id: u32) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| {
            e.metric.name == name && e.algorithm == algorithm && e.dataset_id == dataset_id
        })
    }

    /// Summary of a metric, if present and used
    pub fn summary(&self, name: &str, algorithm: &str, dataset_id: u32) -> Option<f64> {
        self.find(name, algorithm, dataset_id)
            .and_then(|e| e.metric.summary)
    }

    /// Names of the metrics in entry order, without duplicates
    pub fn metric_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !names.contains(&entry.metric.name.as_str()) {
                names.push(&entry.metric.name);
            }
        }
        names
    }
}

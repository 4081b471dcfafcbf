//! Metric registry
//!
//! Holds one [`MetricWrapper`] per (metric name, algorithm, dataset id) and
//! drives dependency-ordered batch recalculation: ordinary metrics first,
//! then meta metrics whose constituents all succeeded in the same batch.

mod snapshot;
mod wrapper;


pub use snapshot::{RegistryEntry, RegistrySnapshot};
pub use wrapper::{MetricSelector, MetricWrapper};

use std::collections::BTreeMap;

use super::builtin::MeanMetric;
use super::metric::{Metric, RecalcParams};
use super::value::MetricValue;

/// Ordered collection of metric wrappers
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    wrappers: Vec<MetricWrapper>,
    locators: BTreeMap<u32, Option<String>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a wrapper. Returns `false` and leaves the registry unchanged when
    /// a wrapper with the same key is already present.
    pub fn add(&mut self, wrapper: MetricWrapper) -> bool {
        if self.contains(wrapper.name(), &wrapper.algorithm, wrapper.dataset_id) {
            tracing::debug!(
                metric = wrapper.name(),
                algorithm = %wrapper.algorithm,
                dataset_id = wrapper.dataset_id,
                "duplicate metric rejected"
            );
            return false;
        }
        self.locators
            .entry(wrapper.dataset_id)
            .or_insert_with(|| wrapper.locator.clone());
        self.wrappers.push(wrapper);
        true
    }

    /// Wrap and add a metric
    pub fn add_metric(
        &mut self,
        metric: Box<dyn Metric>,
        algorithm: &str,
        dataset_id: u32,
        locator: Option<&str>,
    ) -> bool {
        self.add(MetricWrapper::new(
            metric,
            algorithm,
            dataset_id,
            locator.map(str::to_string),
        ))
    }

    /// Add a fresh copy of every template for (algorithm, dataset); returns
    /// how many were added
    pub fn populate(
        &mut self,
        templates: &[Box<dyn Metric>],
        algorithm: &str,
        dataset_id: u32,
        locator: Option<&str>,
    ) -> usize {
        let mut added = 0;
        for template in templates {
            let mut metric = template.clone_box();
            metric.reset();
            if self.add_metric(metric, algorithm, dataset_id, locator) {
                added += 1;
            }
        }
        added
    }

    /// Recalculate the metrics of (algorithm, dataset) matching `selector`.
    ///
    /// Ordinary metrics are recalculated from `params`. Those that succeed
    /// with a used aggregate form the ready set. A matched meta metric is then
    /// recalculated from the ready set only when every constituent is in it.
    ///
    /// Returns an ephemeral registry holding copies of the metrics that were
    /// recalculated by this call.
    pub fn recalc(
        &mut self,
        algorithm: &str,
        dataset_id: u32,
        selector: &MetricSelector,
        params: &RecalcParams<'_>,
    ) -> MetricRegistry {
        let updated = self.recalc_in_place(algorithm, dataset_id, selector, params);
        let mut result = MetricRegistry::new();
        for idx in updated {
            result.add(self.wrappers[idx].clone());
        }
        result
    }

    /// Batch recalculation without copying; returns the positions of the
    /// wrappers that were recalculated
    pub(crate) fn recalc_in_place(
        &mut self,
        algorithm: &str,
        dataset_id: u32,
        selector: &MetricSelector,
        params: &RecalcParams<'_>,
    ) -> Vec<usize> {
        let (meta, normal): (Vec<usize>, Vec<usize>) = self
            .wrappers
            .iter()
            .enumerate()
            .filter(|(_, w)| w.belongs_to(algorithm, dataset_id) && selector.matches(&*w.metric))
            .map(|(idx, _)| idx)
            .partition(|&idx| self.wrappers[idx].metric.is_meta());

        let mut updated = Vec::with_capacity(normal.len() + meta.len());
        let mut ready = Vec::new();

        for idx in normal {
            let metric = &mut self.wrappers[idx].metric;
            if !metric.recalc(params) {
                continue;
            }
            if metric.info().state.has_used_accum() {
                ready.push(idx);
            }
            updated.push(idx);
        }

        for idx in meta {
            let mut metric = self.wrappers[idx].metric.clone_box();
            let views: Vec<&dyn Metric> = ready
                .iter()
                .map(|&r| &*self.wrappers[r].metric)
                .collect();
            let all_ready = metric
                .constituents()
                .iter()
                .all(|name| views.iter().any(|m| m.name() == name));
            if !all_ready {
                tracing::trace!(metric = metric.name(), "meta metric not ready");
                continue;
            }
            if metric.recalc(&RecalcParams::Constituents(&views)) {
                self.wrappers[idx].metric = metric;
                updated.push(idx);
            }
        }

        updated
    }

    pub fn len(&self) -> usize {
        self.wrappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricWrapper> {
        self.wrappers.iter()
    }

    pub fn contains(&self, name: &str, algorithm: &str, dataset_id: u32) -> bool {
        self.get(name, algorithm, dataset_id).is_some()
    }

    /// Wrapper for (metric name, algorithm, dataset id)
    pub fn get(&self, name: &str, algorithm: &str, dataset_id: u32) -> Option<&MetricWrapper> {
        self.wrappers
            .iter()
            .find(|w| w.key() == (name, algorithm, dataset_id))
    }

    /// Locator registered for a dataset id
    pub fn locator(&self, dataset_id: u32) -> Option<&str> {
        self.locators.get(&dataset_id).and_then(|l| l.as_deref())
    }

    /// Algorithm names in insertion order
    pub fn algorithm_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for wrapper in &self.wrappers {
            if !names.contains(&wrapper.algorithm.as_str()) {
                names.push(&wrapper.algorithm);
            }
        }
        names
    }

    /// Dataset ids in ascending order
    pub fn dataset_ids(&self) -> Vec<u32> {
        self.locators.keys().copied().collect()
    }

    /// Metric names in insertion order
    pub fn metric_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for wrapper in &self.wrappers {
            if !names.contains(&wrapper.name()) {
                names.push(wrapper.name());
            }
        }
        names
    }

    pub fn by_algorithm<'a>(&'a self, algorithm: &'a str) -> impl Iterator<Item = &'a MetricWrapper> {
        self.wrappers.iter().filter(move |w| w.algorithm == algorithm)
    }

    pub fn by_dataset(&self, dataset_id: u32) -> impl Iterator<Item = &MetricWrapper> {
        self.wrappers.iter().filter(move |w| w.dataset_id == dataset_id)
    }

    pub fn by_metric_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MetricWrapper> {
        self.wrappers.iter().filter(move |w| w.name() == name)
    }

    /// Wrappers of one (algorithm, dataset) unit
    pub fn by_unit<'a>(
        &'a self,
        algorithm: &'a str,
        dataset_id: u32,
    ) -> impl Iterator<Item = &'a MetricWrapper> {
        self.wrappers
            .iter()
            .filter(move |w| w.belongs_to(algorithm, dataset_id))
    }

    pub fn group_by_algorithm(&self) -> BTreeMap<String, Vec<&MetricWrapper>> {
        let mut groups: BTreeMap<String, Vec<&MetricWrapper>> = BTreeMap::new();
        for wrapper in &self.wrappers {
            groups.entry(wrapper.algorithm.clone()).or_default().push(wrapper);
        }
        groups
    }

    pub fn group_by_dataset(&self) -> BTreeMap<u32, Vec<&MetricWrapper>> {
        let mut groups: BTreeMap<u32, Vec<&MetricWrapper>> = BTreeMap::new();
        for wrapper in &self.wrappers {
            groups.entry(wrapper.dataset_id).or_default().push(wrapper);
        }
        groups
    }

    pub fn group_by_metric_name(&self) -> BTreeMap<String, Vec<&MetricWrapper>> {
        let mut groups: BTreeMap<String, Vec<&MetricWrapper>> = BTreeMap::new();
        for wrapper in &self.wrappers {
            groups
                .entry(wrapper.name().to_string())
                .or_default()
                .push(wrapper);
        }
        groups
    }

    /// Cross-dataset mean of every metric of `algorithm`, one per name.
    ///
    /// Each per-dataset aggregate is fed to a [`MeanMetric`] through the
    /// regular recalculation path. Aggregates without a numeric payload (such
    /// as paired samples) contribute their summary instead.
    pub fn mean(&self, algorithm: &str) -> Vec<MeanMetric> {
        let mut means: Vec<MeanMetric> = Vec::new();
        for wrapper in self.by_algorithm(algorithm) {
            let position = match means.iter().position(|m| m.name() == wrapper.name()) {
                Some(position) => position,
                None => {
                    means.push(MeanMetric::new(
                        wrapper.name(),
                        wrapper.metric.description(),
                    ));
                    means.len() - 1
                }
            };

            let value = wrapper
                .metric
                .accum_value()
                .filter(|v| v.mean_wrapper().is_some())
                .cloned()
                .or_else(|| wrapper.metric.summary().map(MetricValue::real));
            if let Some(value) = value {
                means[position].recalc(&RecalcParams::Value(&value));
            }
        }
        means
    }

    /// Reset every metric, keeping the wrappers
    pub fn reset(&mut self) {
        for wrapper in &mut self.wrappers {
            wrapper.metric.reset();
        }
    }

    /// Drop every wrapper
    pub fn clear(&mut self) {
        self.wrappers.clear();
        self.locators.clear();
    }

    /// Plain-data copy
    pub fn snapshot(&self) -> RegistrySnapshot {
        Self::snapshot_of(self.wrappers.iter())
    }

    /// Plain-data copy of one (algorithm, dataset) unit
    pub fn unit_snapshot(&self, algorithm: &str, dataset_id: u32) -> RegistrySnapshot {
        Self::snapshot_of(self.by_unit(algorithm, dataset_id))
    }

    /// Snapshot of the wrappers at `positions`, with container aggregates
    /// reduced to their summaries
    pub(crate) fn light_snapshot_at(&self, positions: &[usize]) -> RegistrySnapshot {
        RegistrySnapshot {
            entries: positions
                .iter()
                .filter_map(|&idx| self.wrappers.get(idx))
                .map(|w| RegistryEntry {
                    algorithm: w.algorithm.clone(),
                    dataset_id: w.dataset_id,
                    locator: w.locator.clone(),
                    metric: w.metric.light_snapshot(),
                })
                .collect(),
        }
    }

    fn snapshot_of<'a>(wrappers: impl Iterator<Item = &'a MetricWrapper>) -> RegistrySnapshot {
        RegistrySnapshot {
            entries: wrappers
                .map(|w| RegistryEntry {
                    algorithm: w.algorithm.clone(),
                    dataset_id: w.dataset_id,
                    locator: w.locator.clone(),
                    metric: w.metric.snapshot(),
                })
                .collect(),
        }
    }
}

//! Cross-dataset aggregate

use std::any::Any;

use super::super::metric::{Metric, MetricInfo, MetricKind, RecalcParams};
use super::super::value::MetricValue;

/// Mean of another metric's per-dataset aggregates.
///
/// Fed with one prebuilt value per dataset; scalar values are averaged into a
/// `Mean`, list values element-wise into an `ArrayMean`.
#[derive(Debug, Clone)]
pub struct MeanMetric {
    info: MetricInfo,
}

impl MeanMetric {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            info: MetricInfo::new(name, description, MetricKind::Aggregate),
        }
    }
}

impl Metric for MeanMetric {
    fn info(&self) -> &MetricInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MetricInfo {
        &mut self.info
    }

    fn derive(&self, params: &RecalcParams<'_>) -> Option<MetricValue> {
        match params {
            RecalcParams::Value(value) => value.mean_wrapper(),
            _ => None,
        }
    }

    fn clone_box(&self) -> Box<dyn Metric> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

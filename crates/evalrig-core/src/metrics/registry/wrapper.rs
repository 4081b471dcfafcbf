//! Metric plus its (algorithm, dataset) identity

use std::any::TypeId;

use super::super::metric::{Metric, MetricKind};

/// The registry's stored unit
#[derive(Debug, Clone)]
pub struct MetricWrapper {
    pub metric: Box<dyn Metric>,
    pub algorithm: String,
    pub dataset_id: u32,
    pub locator: Option<String>,
}

impl MetricWrapper {
    pub fn new(
        metric: Box<dyn Metric>,
        algorithm: impl Into<String>,
        dataset_id: u32,
        locator: Option<String>,
    ) -> Self {
        Self {
            metric,
            algorithm: algorithm.into(),
            dataset_id,
            locator,
        }
    }

    /// Identity key: (metric name, algorithm, dataset id)
    pub fn key(&self) -> (&str, &str, u32) {
        (self.metric.name(), &self.algorithm, self.dataset_id)
    }

    pub fn name(&self) -> &str {
        self.metric.name()
    }

    pub(crate) fn belongs_to(&self, algorithm: &str, dataset_id: u32) -> bool {
        self.algorithm == algorithm && self.dataset_id == dataset_id
    }
}

/// Filter applied to a batch recalculation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MetricSelector {
    /// Every metric of the (algorithm, dataset)
    #[default]
    Any,
    /// Metrics of exactly this concrete type
    Class(TypeId),
    /// Metrics of this category
    Kind(MetricKind),
    /// The metric with this name
    Name(String),
}

impl MetricSelector {
    /// Select metrics of concrete type `M`
    pub fn class<M: Metric + 'static>() -> Self {
        Self::Class(TypeId::of::<M>())
    }

    pub fn matches(&self, metric: &dyn Metric) -> bool {
        match self {
            Self::Any => true,
            Self::Class(id) => metric.as_any().type_id() == *id,
            Self::Kind(kind) => metric.kind() == *kind,
            Self::Name(name) => metric.name() == name,
        }
    }
}

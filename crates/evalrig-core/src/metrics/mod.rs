//! Metric values, metrics and the metric registry

pub mod builtin;
pub mod metric;
pub mod registry;
pub mod value;

pub use builtin::{
    builtin_metric_names, default_metrics, metric_by_name, metrics_by_names, MeanMetric,
    MetaMetric,
};
pub use metric::{Metric, MetricInfo, MetricKind, MetricSnapshot, MetricState, RecalcParams};
pub use registry::{MetricRegistry, MetricSelector, MetricWrapper, RegistryEntry, RegistrySnapshot};
pub use value::MetricValue;

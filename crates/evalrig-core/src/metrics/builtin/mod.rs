//! Built-in metrics and the name-based factory

mod accuracy;
mod coverage;
mod mean;
mod meta;
mod timing;

pub use accuracy::{
    CorrelationMetric, ElementMaeMetric, ItemRecallMetric, MaeMetric, MseMetric, PrecisionMetric,
};
pub use coverage::RecallMetric;
pub use mean::MeanMetric;
pub use meta::{CombineFn, MetaMetric};
pub use timing::{SetupTimeMetric, SpeedMetric};

use super::metric::Metric;
use crate::error::{EvalError, EvalResult};

/// Names accepted by [`metric_by_name`], in default order
pub fn builtin_metric_names() -> &'static [&'static str] {
    &[
        SetupTimeMetric::NAME,
        SpeedMetric::NAME,
        RecallMetric::NAME,
        MaeMetric::NAME,
        MseMetric::NAME,
        MetaMetric::RMSE,
        CorrelationMetric::NAME,
        PrecisionMetric::NAME,
        ItemRecallMetric::NAME,
        MetaMetric::F1,
        ElementMaeMetric::NAME,
    ]
}

/// Instantiate a built-in metric
pub fn metric_by_name(name: &str) -> Option<Box<dyn Metric>> {
    let metric: Box<dyn Metric> = match name {
        SetupTimeMetric::NAME => Box::new(SetupTimeMetric::new()),
        SpeedMetric::NAME => Box::new(SpeedMetric::new()),
        RecallMetric::NAME => Box::new(RecallMetric::new()),
        MaeMetric::NAME => Box::new(MaeMetric::new()),
        MseMetric::NAME => Box::new(MseMetric::new()),
        MetaMetric::RMSE => Box::new(MetaMetric::rmse()),
        CorrelationMetric::NAME => Box::new(CorrelationMetric::new()),
        PrecisionMetric::NAME => Box::new(PrecisionMetric::new()),
        ItemRecallMetric::NAME => Box::new(ItemRecallMetric::new()),
        MetaMetric::F1 => Box::new(MetaMetric::f1()),
        ElementMaeMetric::NAME => Box::new(ElementMaeMetric::new()),
        _ => return None,
    };
    Some(metric)
}

/// Instantiate every named metric, failing on the first unknown name
pub fn metrics_by_names<S: AsRef<str>>(names: &[S]) -> EvalResult<Vec<Box<dyn Metric>>> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            metric_by_name(name)
                .ok_or_else(|| EvalError::config(format!("Unknown metric: {}", name)))
        })
        .collect()
}

/// Every built-in metric
pub fn default_metrics() -> Vec<Box<dyn Metric>> {
    builtin_metric_names()
        .iter()
        .filter_map(|name| metric_by_name(name))
        .collect()
}

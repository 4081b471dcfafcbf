//! Coverage of the test set

use std::any::Any;

use super::super::metric::{Metric, MetricInfo, MetricKind, RecalcParams};
use super::super::value::MetricValue;

/// Share of test samples for which the algorithm returned a result.
///
/// Fed with a prebuilt `Fraction(executed, total)` once per dataset; the
/// aggregate is the pooled ratio across recalculations.
#[derive(Debug, Clone)]
pub struct RecallMetric {
    info: MetricInfo,
}

impl RecallMetric {
    pub const NAME: &'static str = "recall";

    pub fn new() -> Self {
        Self {
            info: MetricInfo::new(
                Self::NAME,
                "Fraction of test samples that produced a result",
                MetricKind::Coverage,
            ),
        }
    }
}

impl Default for RecallMetric {
    fn default() -> Self {
        Self::new()
    }
}

impl Metric for RecallMetric {
    fn info(&self) -> &MetricInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MetricInfo {
        &mut self.info
    }

    fn derive(&self, params: &RecalcParams<'_>) -> Option<MetricValue> {
        match params {
            RecalcParams::Value(value) if matches!(value, MetricValue::Fraction { .. }) => {
                Some((*value).clone())
            }
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

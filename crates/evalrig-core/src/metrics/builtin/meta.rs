//! Metrics derived from other metrics' aggregates
//!
//! A meta metric never sees raw samples. The registry hands it the metrics
//! recalculated in the same batch; it picks its declared constituents by name,
//! wraps each aggregate in a fresh streaming mean and combines the wrappers.

use std::any::Any;

use super::super::metric::{Metric, MetricInfo, MetricKind, RecalcParams};
use super::super::value::MetricValue;

/// Combines the wrapped constituent aggregates, in declaration order
pub type CombineFn = fn(&[MetricValue]) -> Option<MetricValue>;

/// Second-order metric over named constituents
#[derive(Debug, Clone)]
pub struct MetaMetric {
    info: MetricInfo,
    constituents: Vec<String>,
    combine: CombineFn,
}

impl MetaMetric {
    pub const RMSE: &'static str = "rmse";
    pub const F1: &'static str = "f1";

    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: MetricKind,
        constituents: Vec<String>,
        combine: CombineFn,
    ) -> Self {
        Self {
            info: MetricInfo::new(name, description, kind),
            constituents,
            combine,
        }
    }

    /// Root of the mean squared error
    pub fn rmse() -> Self {
        Self::new(
            Self::RMSE,
            "Root mean squared error of predicted ratings",
            MetricKind::Accuracy,
            vec!["mse".to_string()],
            combine_rmse,
        )
    }

    /// Harmonic mean of precision and item recall
    pub fn f1() -> Self {
        Self::new(
            Self::F1,
            "Harmonic mean of precision and item recall",
            MetricKind::Accuracy,
            vec!["precision".to_string(), "item_recall".to_string()],
            combine_f1,
        )
    }

    /// Wrapped aggregate of the constituent named `name`, if it is ready
    fn wrapped(name: &str, metrics: &[&dyn Metric]) -> Option<MetricValue> {
        let metric = metrics.iter().find(|m| m.name() == name)?;
        if !metric.is_valid() || !metric.info().state.has_used_accum() {
            return None;
        }
        metric.accum_value()?.mean_wrapper()
    }
}

fn combine_rmse(values: &[MetricValue]) -> Option<MetricValue> {
    let mse = values.first()?.scalar()?;
    if mse < 0.0 {
        return None;
    }
    Some(MetricValue::real(mse.sqrt()))
}

fn combine_f1(values: &[MetricValue]) -> Option<MetricValue> {
    let precision = values.first()?.scalar()?;
    let recall = values.get(1)?.scalar()?;
    let sum = precision + recall;
    if sum == 0.0 {
        return Some(MetricValue::real(0.0));
    }
    Some(MetricValue::real(2.0 * precision * recall / sum))
}

impl Metric for MetaMetric {
    fn info(&self) -> &MetricInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MetricInfo {
        &mut self.info
    }

    fn derive(&self, params: &RecalcParams<'_>) -> Option<MetricValue> {
        let RecalcParams::Constituents(metrics) = params else {
            return None;
        };
        let wrapped = self
            .constituents
            .iter()
            .map(|name| Self::wrapped(name, metrics))
            .collect::<Option<Vec<_>>>()?;
        (self.combine)(&wrapped)
    }

    /// Constituent aggregates already span every sample, so the derived value
    /// replaces the aggregate instead of being merged into it.
    fn recalc(&mut self, params: &RecalcParams<'_>) -> bool {
        match self.derive(params) {
            Some(derived) => {
                self.info.state.replace(derived);
                true
            }
            None => false,
        }
    }

    fn constituents(&self) -> &[String] {
        &self.constituents
    }

    fn clone_box(&self) -> Box<dyn Metric> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Prediction;
    use crate::metrics::builtin::{ItemRecallMetric, MseMetric, PrecisionMetric};

    fn rated(metric: &mut dyn Metric, pairs: &[(f64, f64)]) {
        for (c, e) in pairs {
            let (c, e) = (Prediction::Rating(*c), Prediction::Rating(*e));
            metric.recalc(&RecalcParams::Pair {
                computed: &c,
                expected: &e,
            });
        }
    }

    #[test]
    fn test_rmse_from_mse() {
        let mut mse = MseMetric::new();
        rated(&mut mse, &[(1.0, 3.0), (2.0, 4.0)]);

        let mut rmse = MetaMetric::rmse();
        let views: Vec<&dyn Metric> = vec![&mse];
        assert!(rmse.recalc(&RecalcParams::Constituents(&views)));
        assert_eq!(rmse.summary(), Some(2.0));
    }

    #[test]
    fn test_rmse_replaces_accum() {
        let mut mse = MseMetric::new();
        rated(&mut mse, &[(1.0, 3.0)]);

        let mut rmse = MetaMetric::rmse();
        {
            let views: Vec<&dyn Metric> = vec![&mse];
            rmse.recalc(&RecalcParams::Constituents(&views));
        }
        rated(&mut mse, &[(1.0, 5.0)]);
        let views: Vec<&dyn Metric> = vec![&mse];
        rmse.recalc(&RecalcParams::Constituents(&views));

        // mse is now (4 + 16) / 2
        assert!((rmse.summary().unwrap() - 10f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_missing_constituent_skips() {
        let mut precision = PrecisionMetric::new();
        let computed = Prediction::Items(vec!["a".into()]);
        let expected = Prediction::Items(vec!["a".into(), "b".into()]);
        precision.recalc(&RecalcParams::Pair {
            computed: &computed,
            expected: &expected,
        });

        let mut f1 = MetaMetric::f1();
        let views: Vec<&dyn Metric> = vec![&precision];
        assert!(!f1.recalc(&RecalcParams::Constituents(&views)));
        assert!(!f1.is_valid());

        let mut recall = ItemRecallMetric::new();
        recall.recalc(&RecalcParams::Pair {
            computed: &computed,
            expected: &expected,
        });
        let views: Vec<&dyn Metric> = vec![&precision, &recall];
        assert!(f1.recalc(&RecalcParams::Constituents(&views)));
        // p = 1, r = 0.5
        assert!((f1.summary().unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_unused_constituent_skips() {
        let mse = MseMetric::new();
        let mut rmse = MetaMetric::rmse();
        let views: Vec<&dyn Metric> = vec![&mse];
        assert!(!rmse.recalc(&RecalcParams::Constituents(&views)));
    }

    #[test]
    fn test_f1_zero_when_no_hits() {
        let values = [MetricValue::mean(0.0), MetricValue::mean(0.0)];
        assert_eq!(combine_f1(&values), Some(MetricValue::real(0.0)));
    }

    #[test]
    fn test_is_meta() {
        assert!(MetaMetric::rmse().is_meta());
        assert!(!MseMetric::new().is_meta());
    }
}

//! Accuracy metrics fed with (computed, expected) pairs

use std::any::Any;
use std::collections::HashSet;

use super::super::metric::{Metric, MetricInfo, MetricKind, RecalcParams};
use super::super::value::MetricValue;
use crate::dataset::Prediction;

fn rating_pair(params: &RecalcParams<'_>) -> Option<(f64, f64)> {
    match params {
        RecalcParams::Pair {
            computed: Prediction::Rating(computed),
            expected: Prediction::Rating(expected),
        } if computed.is_finite() && expected.is_finite() => Some((*computed, *expected)),
        _ => None,
    }
}

fn vector_pair<'a>(params: &RecalcParams<'a>) -> Option<(&'a [f64], &'a [f64])> {
    match *params {
        RecalcParams::Pair {
            computed: Prediction::Vector(computed),
            expected: Prediction::Vector(expected),
        } if computed.len() == expected.len() && !computed.is_empty() => {
            Some((computed.as_slice(), expected.as_slice()))
        }
        _ => None,
    }
}

/// Returns (hits, recommended, relevant) for an item-list pair
fn item_hits(params: &RecalcParams<'_>) -> Option<(usize, usize, usize)> {
    match params {
        RecalcParams::Pair {
            computed: Prediction::Items(computed),
            expected: Prediction::Items(expected),
        } => {
            let recommended: HashSet<&str> = computed.iter().map(String::as_str).collect();
            let relevant: HashSet<&str> = expected.iter().map(String::as_str).collect();
            let hits = recommended.intersection(&relevant).count();
            Some((hits, recommended.len(), relevant.len()))
        }
        _ => None,
    }
}

/// Pearson correlation of paired scalar samples
pub(crate) fn pearson(left: &[MetricValue], right: &[MetricValue]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = left
        .iter()
        .zip(right)
        .filter_map(|(l, r)| Some((l.scalar()?, r.scalar()?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x * var_y).sqrt())
}

macro_rules! accuracy_metric {
    ($(#[$doc:meta])* $ty:ident, $name:literal, $description:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $ty {
            info: MetricInfo,
        }

        impl $ty {
            pub const NAME: &'static str = $name;

            pub fn new() -> Self {
                Self {
                    info: MetricInfo::new(Self::NAME, $description, MetricKind::Accuracy),
                }
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

accuracy_metric!(
    /// Mean absolute error of rating predictions
    MaeMetric,
    "mae",
    "Mean absolute error of predicted ratings"
);

accuracy_metric!(
    /// Mean squared error of rating predictions
    MseMetric,
    "mse",
    "Mean squared error of predicted ratings"
);

accuracy_metric!(
    /// Pearson correlation between predicted and expected ratings
    CorrelationMetric,
    "correlation",
    "Pearson correlation of predicted and expected ratings"
);

accuracy_metric!(
    /// Share of recommended items that are relevant
    PrecisionMetric,
    "precision",
    "Fraction of recommended items that are relevant"
);

accuracy_metric!(
    /// Share of relevant items that were recommended
    ItemRecallMetric,
    "item_recall",
    "Fraction of relevant items that were recommended"
);

accuracy_metric!(
    /// Per-component absolute error of vector predictions
    ElementMaeMetric,
    "element_mae",
    "Element-wise mean absolute error of predicted vectors"
);

impl Metric for MaeMetric {
    fn info(&self) -> &MetricInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MetricInfo {
        &mut self.info
    }

    fn derive(&self, params: &RecalcParams<'_>) -> Option<MetricValue> {
        let (computed, expected) = rating_pair(params)?;
        Some(MetricValue::mean((computed - expected).abs()))
    }

    fn clone_box(&self) -> Box<dyn Metric> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Metric for MseMetric {
    fn info(&self) -> &MetricInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MetricInfo {
        &mut self.info
    }

    fn derive(&self, params: &RecalcParams<'_>) -> Option<MetricValue> {
        let (computed, expected) = rating_pair(params)?;
        Some(MetricValue::mean((computed - expected).powi(2)))
    }

    fn clone_box(&self) -> Box<dyn Metric> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Metric for CorrelationMetric {
    fn info(&self) -> &MetricInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MetricInfo {
        &mut self.info
    }

    fn derive(&self, params: &RecalcParams<'_>) -> Option<MetricValue> {
        let (computed, expected) = rating_pair(params)?;
        Some(MetricValue::two_array(
            vec![MetricValue::real(computed)],
            vec![MetricValue::real(expected)],
        ))
    }

    fn summary(&self) -> Option<f64> {
        match self.accum_value()? {
            MetricValue::TwoArray { left, right } => pearson(left, right),
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

impl Metric for PrecisionMetric {
    fn info(&self) -> &MetricInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MetricInfo {
        &mut self.info
    }

    fn derive(&self, params: &RecalcParams<'_>) -> Option<MetricValue> {
        let (hits, recommended, _) = item_hits(params)?;
        Some(MetricValue::fraction(hits as f64, recommended as f64))
    }

    fn clone_box(&self) -> Box<dyn Metric> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Metric for ItemRecallMetric {
    fn info(&self) -> &MetricInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MetricInfo {
        &mut self.info
    }

    fn derive(&self, params: &RecalcParams<'_>) -> Option<MetricValue> {
        let (hits, _, relevant) = item_hits(params)?;
        Some(MetricValue::fraction(hits as f64, relevant as f64))
    }

    fn clone_box(&self) -> Box<dyn Metric> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Metric for ElementMaeMetric {
    fn info(&self) -> &MetricInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut MetricInfo {
        &mut self.info
    }

    fn derive(&self, params: &RecalcParams<'_>) -> Option<MetricValue> {
        let (computed, expected) = vector_pair(params)?;
        if computed.iter().chain(expected).any(|v| !v.is_finite()) {
            return None;
        }
        let items = computed
            .iter()
            .zip(expected)
            .map(|(c, e)| MetricValue::mean((c - e).abs()))
            .collect();
        Some(MetricValue::vector(items))
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

    fn pair<'a>(computed: &'a Prediction, expected: &'a Prediction) -> RecalcParams<'a> {
        RecalcParams::Pair { computed, expected }
    }

    #[test]
    fn test_mae_and_mse() {
        let mut mae = MaeMetric::new();
        let mut mse = MseMetric::new();
        for (c, e) in [(4.0, 5.0), (3.0, 1.0), (2.0, 2.0)] {
            let (c, e) = (Prediction::Rating(c), Prediction::Rating(e));
            assert!(mae.recalc(&pair(&c, &e)));
            assert!(mse.recalc(&pair(&c, &e)));
        }
        assert!((mae.summary().unwrap() - 1.0).abs() < 1e-12);
        assert!((mse.summary().unwrap() - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_mismatched_prediction_shapes_rejected() {
        let mut mae = MaeMetric::new();
        let computed = Prediction::Items(vec!["a".into()]);
        let expected = Prediction::Rating(1.0);
        assert!(!mae.recalc(&pair(&computed, &expected)));
        assert!(!mae.is_valid());
    }

    #[test]
    fn test_correlation_summary() {
        let mut metric = CorrelationMetric::new();
        for (c, e) in [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)] {
            let (c, e) = (Prediction::Rating(c), Prediction::Rating(e));
            metric.recalc(&pair(&c, &e));
        }
        assert!((metric.summary().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_precision_and_item_recall() {
        let computed = Prediction::Items(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        let expected = Prediction::Items(vec!["b".into(), "d".into()]);

        let mut precision = PrecisionMetric::new();
        let mut recall = ItemRecallMetric::new();
        assert!(precision.recalc(&pair(&computed, &expected)));
        assert!(recall.recalc(&pair(&computed, &expected)));

        assert_eq!(precision.current_value(), Some(&MetricValue::fraction(2.0, 4.0)));
        assert_eq!(recall.summary(), Some(1.0));
    }

    #[test]
    fn test_element_mae() {
        let mut metric = ElementMaeMetric::new();
        let computed = Prediction::Vector(vec![1.0, 2.0]);
        let expected = Prediction::Vector(vec![2.0, 2.0]);
        assert!(metric.recalc(&pair(&computed, &expected)));

        let computed = Prediction::Vector(vec![3.0, 1.0]);
        assert!(metric.recalc(&pair(&computed, &expected)));

        assert_eq!(
            metric.accum_value().and_then(MetricValue::scalars),
            Some(vec![1.0, 0.5])
        );

        let short = Prediction::Vector(vec![1.0]);
        assert!(!metric.recalc(&pair(&short, &expected)));
    }

    #[test]
    fn test_pearson_degenerate() {
        let constant = vec![MetricValue::real(1.0), MetricValue::real(1.0)];
        let varying = vec![MetricValue::real(1.0), MetricValue::real(2.0)];
        assert_eq!(pearson(&constant, &varying), None);
        assert_eq!(pearson(&varying[..1], &varying[..1]), None);
    }
}

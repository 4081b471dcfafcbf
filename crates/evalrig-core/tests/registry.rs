use evalrig_core::dataset::Prediction;
use evalrig_core::metrics::builtin::{ItemRecallMetric, MaeMetric, MetaMetric, PrecisionMetric};
use evalrig_core::{Metric, MetricRegistry, MetricSelector, MetricValue, RecalcParams};

#[test]
fn test_identical_key_rejected() {
    let mut registry = MetricRegistry::new();
    assert!(registry.add_metric(Box::new(MaeMetric::new()), "A", 1, None));
    assert!(!registry.add_metric(Box::new(MaeMetric::new()), "A", 1, Some("elsewhere")));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.locator(1), None);
}

#[test]
fn test_f1_needs_both_constituents_in_one_batch() {
    let mut registry = MetricRegistry::new();
    registry.add_metric(Box::new(PrecisionMetric::new()), "A", 1, None);
    registry.add_metric(Box::new(ItemRecallMetric::new()), "A", 1, None);
    registry.add_metric(Box::new(MetaMetric::f1()), "A", 1, None);

    let computed = Prediction::Items(vec!["x".into(), "y".into()]);
    let expected = Prediction::Items(vec!["x".into()]);
    let params = RecalcParams::Pair {
        computed: &computed,
        expected: &expected,
    };

    // only precision in this batch
    registry.recalc("A", 1, &MetricSelector::class::<PrecisionMetric>(), &params);
    assert!(registry.get("f1", "A", 1).unwrap().metric.current_value().is_none());

    // both constituents in the batch, f1 selected as well
    let batch = registry.recalc("A", 1, &MetricSelector::Any, &params);
    assert_eq!(batch.len(), 3);

    // precision 2/4 pooled over both batches, item recall 1/1
    let f1 = registry.get("f1", "A", 1).unwrap().metric.summary().unwrap();
    assert!((f1 - 2.0 * 0.5 * 1.0 / 1.5).abs() < 1e-12);
}

#[test]
fn test_fraction_pooling_property() {
    for (a1, b1, a2, b2) in [(1.0, 2.0, 3.0, 4.0), (0.0, 5.0, 5.0, 5.0), (7.0, 9.0, 1.0, 1.0)] {
        let mut value = MetricValue::fraction(a1, b1);
        let original = value.clone();
        let mut copy = original.clone();
        copy.accum(&MetricValue::fraction(a2, b2));
        assert_eq!(original, MetricValue::fraction(a1, b1));

        value.accum(&MetricValue::fraction(a2, b2));
        assert_eq!(value, MetricValue::fraction(a1 + a2, b1 + b2));
        assert_eq!(value.scalar(), Some((a1 + a2) / (b1 + b2)));
    }
}

#[test]
fn test_recalc_false_leaves_state() {
    let mut mae = MaeMetric::new();
    assert!(!mae.recalc(&RecalcParams::Elapsed(1.0)));
    assert!(!mae.is_valid());
    assert!(mae.accum_value().is_none());
}

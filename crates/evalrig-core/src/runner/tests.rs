use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::{json, Value};

use super::*;
use crate::algorithm::{Algorithm, AlgorithmConfig};
use crate::config::EvalConfig;
use crate::dataset::{
    Cursor, Dataset, DatasetPair, DatasetPool, MemoryDataset, Prediction, Sample,
};
use crate::error::{EvalError, EvalResult};
use crate::events::{LifecycleEvent, LifecycleStatus};
use crate::metrics::MetricValue;

#[derive(Debug, Clone, Default)]
struct Counters {
    setups: Arc<AtomicUsize>,
    executes: Arc<AtomicUsize>,
    teardowns: Arc<AtomicUsize>,
}

#[derive(Debug, Clone)]
enum Behavior {
    Echo,
    FailSetup,
    PanicOnExecute,
    FailExecute,
}

#[derive(Debug, Clone)]
struct TestAlgorithm {
    name: String,
    behavior: Behavior,
    delay_teardown: bool,
    counters: Counters,
}

impl TestAlgorithm {
    fn new(name: &str, behavior: Behavior, counters: &Counters) -> Self {
        Self {
            name: name.to_string(),
            behavior,
            delay_teardown: false,
            counters: counters.clone(),
        }
    }
}

impl Algorithm for TestAlgorithm {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> AlgorithmConfig {
        AlgorithmConfig::default().with_delay_teardown(self.delay_teardown)
    }

    fn new_instance(&self) -> Box<dyn Algorithm> {
        Box::new(self.clone())
    }

    fn setup(&mut self, _training: &dyn Dataset, _extra: &Value) -> EvalResult<()> {
        self.counters.setups.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::FailSetup => Err(EvalError::algorithm(&self.name, "setup refused")),
            _ => Ok(()),
        }
    }

    fn execute(&mut self, input: &Value) -> EvalResult<Option<Prediction>> {
        self.counters.executes.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::PanicOnExecute => panic!("execute exploded"),
            Behavior::FailExecute => Err(EvalError::algorithm(&self.name, "execute refused")),
            _ => Ok(input.as_f64().map(Prediction::Rating)),
        }
    }

    fn unsetup(&mut self) -> EvalResult<()> {
        self.counters.teardowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Testing side that records whether its cursor was closed
#[derive(Debug)]
struct TrackedDataset {
    inner: MemoryDataset,
    closed: Arc<AtomicUsize>,
}

struct TrackedCursor {
    inner: Box<dyn Cursor>,
    closed: Arc<AtomicUsize>,
}

impl Cursor for TrackedCursor {
    fn size(&self) -> usize {
        self.inner.size()
    }

    fn next_sample(&mut self) -> EvalResult<Option<Sample>> {
        self.inner.next_sample()
    }

    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
        self.inner.close();
    }
}

impl Dataset for TrackedDataset {
    fn id(&self) -> u32 {
        self.inner.id()
    }

    fn fetch(&self) -> EvalResult<Box<dyn Cursor>> {
        Ok(Box::new(TrackedCursor {
            inner: self.inner.fetch()?,
            closed: Arc::clone(&self.closed),
        }))
    }
}

fn samples(n: usize) -> Vec<Sample> {
    (0..n)
        .map(|i| Sample::labeled(json!(i as f64), Prediction::Rating(i as f64 + 1.0)))
        .collect()
}

fn pool(ids: &[u32], n: usize) -> DatasetPool {
    let mut pool = DatasetPool::new();
    for id in ids {
        pool.add(DatasetPair::new(
            *id,
            Arc::new(MemoryDataset::new(*id, samples(n))),
            Arc::new(MemoryDataset::new(*id, samples(n))),
        ))
        .unwrap();
    }
    pool
}

fn statuses(runner: &EvaluationRunner) -> Arc<Mutex<Vec<LifecycleStatus>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    runner
        .hub()
        .add_lifecycle_listener(Arc::new(move |event: &LifecycleEvent| {
            sink.lock().push(event.status)
        }));
    seen
}

#[test]
fn test_rejects_empty_inputs() {
    let runner = EvaluationRunner::new(EvalConfig::default()).unwrap();
    let counters = Counters::default();

    let err = runner
        .evaluate(Vec::new(), pool(&[1], 1), Value::Null)
        .unwrap_err();
    assert!(matches!(err, EvalError::InvalidInput { .. }));

    let algorithms: Vec<Box<dyn Algorithm>> =
        vec![Box::new(TestAlgorithm::new("A", Behavior::Echo, &counters))];
    let err = runner
        .evaluate(algorithms, DatasetPool::new(), Value::Null)
        .unwrap_err();
    assert!(matches!(err, EvalError::InvalidInput { .. }));
    assert!(!runner.is_started());
}

#[test]
fn test_rejects_duplicate_algorithm_names() {
    let runner = EvaluationRunner::new(EvalConfig::default()).unwrap();
    let counters = Counters::default();
    let algorithms: Vec<Box<dyn Algorithm>> = vec![
        Box::new(TestAlgorithm::new("A", Behavior::Echo, &counters)),
        Box::new(TestAlgorithm::new("A", Behavior::Echo, &counters)),
    ];
    assert!(runner.evaluate(algorithms, pool(&[1], 1), Value::Null).is_err());
}

#[test]
fn test_unknown_metric_in_config() {
    let config = EvalConfig::default().with_metrics(["mae", "bogus"]);
    assert!(matches!(
        EvaluationRunner::new(config),
        Err(EvalError::Config { .. })
    ));
}

#[test]
fn test_derived_metric_without_constituent_in_config() {
    let config = EvalConfig::default().with_metrics(["recall", "rmse"]);
    assert!(matches!(
        EvaluationRunner::new(config),
        Err(EvalError::Config { .. })
    ));
}

#[test]
fn test_failed_unit_does_not_stop_the_run() {
    let runner = EvaluationRunner::new(EvalConfig::default()).unwrap();
    let seen = statuses(&runner);
    let counters = Counters::default();
    let algorithms: Vec<Box<dyn Algorithm>> = vec![
        Box::new(TestAlgorithm::new("broken", Behavior::FailSetup, &counters)),
        Box::new(TestAlgorithm::new("panics", Behavior::PanicOnExecute, &counters)),
        Box::new(TestAlgorithm::new("errors", Behavior::FailExecute, &counters)),
        Box::new(TestAlgorithm::new("works", Behavior::Echo, &counters)),
    ];

    runner.evaluate(algorithms, pool(&[1, 2], 3), Value::Null).unwrap();
    runner.wait();

    let registry = runner.result_registry();
    for dataset_id in [1, 2] {
        let setup = registry.get("setup_time", "broken", dataset_id).unwrap();
        assert!(setup.metric.summary().is_none());
        let recall = registry.get("recall", "panics", dataset_id).unwrap();
        assert!(recall.metric.summary().is_none());
        let recall = registry.get("recall", "works", dataset_id).unwrap();
        assert_eq!(recall.metric.summary(), Some(1.0));
        let mae = registry.get("mae", "works", dataset_id).unwrap();
        assert_eq!(mae.metric.summary(), Some(1.0));
    }

    let seen = seen.lock();
    assert_eq!(
        seen.iter().filter(|s| **s == LifecycleStatus::DoneOne).count(),
        8
    );
    assert_eq!(seen.first(), Some(&LifecycleStatus::Started));
    assert_eq!(seen.last(), Some(&LifecycleStatus::Done));
    assert!(!seen.contains(&LifecycleStatus::Stopped));

    // instances whose setup failed are never torn down
    assert_eq!(counters.setups.load(Ordering::SeqCst), 8);
    assert_eq!(counters.teardowns.load(Ordering::SeqCst), 6);
}

#[test]
fn test_cursor_closed_after_execute_failure() {
    let runner = EvaluationRunner::new(EvalConfig::default()).unwrap();
    let counters = Counters::default();
    let closed = Arc::new(AtomicUsize::new(0));

    let mut pool = DatasetPool::new();
    pool.add(DatasetPair::new(
        4,
        Arc::new(MemoryDataset::new(4, samples(2))),
        Arc::new(TrackedDataset {
            inner: MemoryDataset::new(4, samples(2)),
            closed: Arc::clone(&closed),
        }),
    ))
    .unwrap();

    let algorithms: Vec<Box<dyn Algorithm>> = vec![
        Box::new(TestAlgorithm::new("errors", Behavior::FailExecute, &counters)),
        Box::new(TestAlgorithm::new("works", Behavior::Echo, &counters)),
    ];
    runner.evaluate(algorithms, pool, Value::Null).unwrap();
    runner.wait();

    assert_eq!(closed.load(Ordering::SeqCst), 2);
    // the failing unit stopped at its first sample
    assert_eq!(counters.executes.load(Ordering::SeqCst), 3);
}

#[test]
fn test_delayed_teardown_runs_on_next_evaluate_and_stop() {
    let runner = EvaluationRunner::new(EvalConfig::default()).unwrap();
    let counters = Counters::default();
    let mut algorithm = TestAlgorithm::new("A", Behavior::Echo, &counters);
    algorithm.delay_teardown = true;

    runner
        .evaluate(vec![Box::new(algorithm.clone())], pool(&[1, 2], 1), Value::Null)
        .unwrap();
    runner.wait();
    assert_eq!(counters.teardowns.load(Ordering::SeqCst), 0);
    assert_eq!(runner.deferred_teardowns(), 2);

    runner
        .evaluate(vec![Box::new(algorithm)], pool(&[1], 1), Value::Null)
        .unwrap();
    runner.wait();
    assert_eq!(counters.teardowns.load(Ordering::SeqCst), 2);
    assert_eq!(runner.deferred_teardowns(), 1);

    runner.stop();
    assert_eq!(counters.teardowns.load(Ordering::SeqCst), 3);
    assert_eq!(runner.deferred_teardowns(), 0);
}

#[test]
fn test_config_delay_teardown_applies_to_all() {
    let runner = EvaluationRunner::new(EvalConfig::default().with_delay_teardown(true)).unwrap();
    let counters = Counters::default();

    runner
        .evaluate(
            vec![Box::new(TestAlgorithm::new("A", Behavior::Echo, &counters))],
            pool(&[1], 2),
            Value::Null,
        )
        .unwrap();
    runner.wait();
    assert_eq!(runner.deferred_teardowns(), 1);

    runner.close();
    assert_eq!(counters.teardowns.load(Ordering::SeqCst), 1);
}

#[test]
fn test_control_when_idle() {
    let runner = EvaluationRunner::new(EvalConfig::default()).unwrap();
    assert_eq!(runner.pause(), Err(EvalError::NotRunning));
    assert_eq!(runner.resume(), Err(EvalError::NotRunning));
    assert!(!runner.force_stop());
    runner.stop();
    assert_eq!(runner.state(), RunnerState::Idle);
}

#[test]
fn test_registry_populated_per_unit() {
    let config = EvalConfig::default().with_metrics(["recall", "mae"]);
    let runner = EvaluationRunner::new(config).unwrap();
    let counters = Counters::default();

    runner
        .evaluate(
            vec![
                Box::new(TestAlgorithm::new("A", Behavior::Echo, &counters)),
                Box::new(TestAlgorithm::new("B", Behavior::Echo, &counters)),
            ],
            pool(&[1, 2, 3], 1),
            Value::Null,
        )
        .unwrap();
    runner.wait();

    let registry = runner.result_registry();
    assert_eq!(registry.len(), 2 * 3 * 2);
    assert_eq!(registry.algorithm_names(), vec!["A", "B"]);
    assert_eq!(runner.result_snapshot().len(), registry.len());
}

#[test]
fn test_failed_setup_is_neither_torn_down_nor_deferred() {
    let runner = EvaluationRunner::new(EvalConfig::default().with_delay_teardown(true)).unwrap();
    let counters = Counters::default();

    runner
        .evaluate(
            vec![Box::new(TestAlgorithm::new("broken", Behavior::FailSetup, &counters))],
            pool(&[1, 2], 2),
            Value::Null,
        )
        .unwrap();
    runner.wait();
    assert_eq!(counters.setups.load(Ordering::SeqCst), 2);
    assert_eq!(runner.deferred_teardowns(), 0);

    runner.close();
    assert_eq!(counters.teardowns.load(Ordering::SeqCst), 0);
}

#[test]
fn test_drop_runs_deferred_teardown() {
    let counters = Counters::default();
    let mut algorithm = TestAlgorithm::new("A", Behavior::Echo, &counters);
    algorithm.delay_teardown = true;

    let runner = EvaluationRunner::new(EvalConfig::default()).unwrap();
    runner
        .evaluate(vec![Box::new(algorithm)], pool(&[1, 2], 1), Value::Null)
        .unwrap();
    runner.wait();
    assert_eq!(runner.deferred_teardowns(), 2);
    assert_eq!(counters.teardowns.load(Ordering::SeqCst), 0);

    drop(runner);
    assert_eq!(counters.teardowns.load(Ordering::SeqCst), 2);
}

/// Testing side whose cursor cannot be opened
#[derive(Debug)]
struct UnavailableDataset {
    id: u32,
}

impl Dataset for UnavailableDataset {
    fn id(&self) -> u32 {
        self.id
    }

    fn fetch(&self) -> EvalResult<Box<dyn Cursor>> {
        Err(EvalError::dataset("connection refused"))
    }
}

#[test]
fn test_unavailable_testing_set_fails_only_its_unit() {
    let runner = EvaluationRunner::new(EvalConfig::default()).unwrap();
    let seen = statuses(&runner);
    let counters = Counters::default();

    let mut datasets = pool(&[1], 2);
    datasets.add(DatasetPair::new(
        9,
        Arc::new(MemoryDataset::new(9, samples(2))),
        Arc::new(UnavailableDataset { id: 9 }),
    ))
    .unwrap();

    runner
        .evaluate(
            vec![Box::new(TestAlgorithm::new("A", Behavior::Echo, &counters))],
            datasets,
            Value::Null,
        )
        .unwrap();
    runner.wait();

    let registry = runner.result_registry();
    assert_eq!(registry.get("recall", "A", 1).unwrap().metric.summary(), Some(1.0));
    assert!(registry.get("recall", "A", 9).unwrap().metric.summary().is_none());
    assert!(registry.get("setup_time", "A", 9).unwrap().metric.summary().is_some());
    assert_eq!(counters.executes.load(Ordering::SeqCst), 2);
    assert_eq!(counters.teardowns.load(Ordering::SeqCst), 2);

    let seen = seen.lock();
    assert_eq!(
        seen.iter().filter(|s| **s == LifecycleStatus::DoneOne).count(),
        2
    );
    assert!(!seen.contains(&LifecycleStatus::Stopped));
}

#[test]
fn test_doing_events_do_not_grow_with_the_step() {
    let config = EvalConfig::default().with_metrics(["mae", "mse", "rmse", "correlation"]);
    let runner = EvaluationRunner::new(config).unwrap();
    let counters = Counters::default();

    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&sizes);
    runner
        .hub()
        .add_lifecycle_listener(Arc::new(move |event: &LifecycleEvent| {
            if event.status == LifecycleStatus::Doing && event.result.is_some() {
                let json = serde_json::to_string(&event.metrics).unwrap();
                sink.lock().push(json.len());
            }
        }));
    let done_one = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&done_one);
    runner
        .hub()
        .add_lifecycle_listener(Arc::new(move |event: &LifecycleEvent| {
            if event.status == LifecycleStatus::DoneOne {
                *sink.lock() = Some(event.metrics.clone());
            }
        }));

    // exact predictions keep every running mean at zero
    let samples: Vec<Sample> = (0..300)
        .map(|_| Sample::labeled(json!(2.0), Prediction::Rating(2.0)))
        .collect();
    let mut pool = DatasetPool::new();
    pool.add(DatasetPair::new(
        1,
        Arc::new(MemoryDataset::new(1, samples.clone())),
        Arc::new(MemoryDataset::new(1, samples)),
    ))
    .unwrap();

    runner
        .evaluate(
            vec![Box::new(TestAlgorithm::new("A", Behavior::Echo, &counters))],
            pool,
            Value::Null,
        )
        .unwrap();
    runner.wait();

    let sizes = sizes.lock();
    assert_eq!(sizes.len(), 300);
    // same number of digits in the running counts
    assert_eq!(sizes[100], sizes[299]);

    // the per-unit result still carries the full paired aggregate
    let done_one = done_one.lock().clone().unwrap();
    let correlation = done_one.find("correlation", "A", 1).unwrap();
    match &correlation.metric.accum {
        Some(MetricValue::TwoArray { left, .. }) => assert_eq!(left.len(), 300),
        other => panic!("unexpected aggregate: {:?}", other),
    }
}

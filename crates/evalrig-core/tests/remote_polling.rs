mod common;

use common::{pool_of, rating_samples, EchoAlgorithm, EventLog};
use evalrig_core::{EvalConfig, EvaluationRunner, LifecycleStatus};
use serde_json::Value;

fn run_with_capacity(capacity: usize) -> (EvaluationRunner, String, usize) {
    let runner =
        EvaluationRunner::new(EvalConfig::default().with_queue_capacity(capacity)).unwrap();
    let log = EventLog::attach(runner.hub());
    let listener_id = runner.hub().register_remote(Some("remote-1".to_string()));

    let samples = rating_samples(&[(1.0, 2.0), (2.0, 2.0), (3.0, 2.0)]);
    runner
        .evaluate(EchoAlgorithm::new("A").boxed(), pool_of(&[1], &samples), Value::Null)
        .unwrap();
    runner.wait();

    let emitted = log.len();
    (runner, listener_id, emitted)
}

#[test]
fn test_drain_returns_everything_under_capacity() {
    let (runner, id, emitted) = run_with_capacity(10_000);

    let drained = runner.hub().drain_events(&id).unwrap();
    assert_eq!(drained.len(), emitted);
    assert_eq!(
        drained.last().and_then(|e| e.as_lifecycle()).map(|e| e.status),
        Some(LifecycleStatus::Done)
    );
    assert!(runner.hub().drain_events(&id).unwrap().is_empty());
}

#[test]
fn test_drain_is_capped() {
    let (runner, id, emitted) = run_with_capacity(4);
    assert!(emitted > 4);

    let drained = runner.hub().drain_events(&id).unwrap();
    assert_eq!(drained.len(), 4);
    // oldest events were dropped, the newest survive
    assert_eq!(
        drained.last().and_then(|e| e.as_lifecycle()).map(|e| e.status),
        Some(LifecycleStatus::Done)
    );
    assert!(runner.hub().drain_events(&id).unwrap().is_empty());
}

#[test]
fn test_remote_and_local_see_the_same_order() {
    let runner = EvaluationRunner::new(EvalConfig::default()).unwrap();
    let log = EventLog::attach(runner.hub());
    let id = runner.hub().register_remote(None);

    let samples = rating_samples(&[(1.0, 1.0), (2.0, 1.0)]);
    runner
        .evaluate(EchoAlgorithm::new("A").boxed(), pool_of(&[1, 2], &samples), Value::Null)
        .unwrap();
    runner.wait();

    let remote = runner.hub().drain_events(&id).unwrap();
    assert_eq!(remote, log.events());
}

#[test]
fn test_close_discards_remote_queues() {
    let (runner, id, _) = run_with_capacity(100);
    runner.close();
    assert!(runner.hub().drain_events(&id).is_err());
}

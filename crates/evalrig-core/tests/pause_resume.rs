mod common;

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use common::{pool_of, rating_samples, EchoAlgorithm, EventLog};
use evalrig_core::{
    EvalConfig, EvalError, EvaluationRunner, LifecycleEvent, LifecycleStatus, ProgressEvent,
    RunnerState,
};
use serde_json::Value;

const TIMEOUT: Duration = Duration::from_secs(10);

/// Runner that pauses itself when progress reaches `pause_at`, and a channel
/// reporting every lifecycle status
fn pausing_runner(pause_at: usize) -> (Arc<EvaluationRunner>, mpsc::Receiver<LifecycleStatus>) {
    let runner = Arc::new(EvaluationRunner::new(EvalConfig::default()).unwrap());

    let handle = Arc::clone(&runner);
    runner
        .hub()
        .add_progress_listener(Arc::new(move |event: &ProgressEvent| {
            if event.step == pause_at {
                handle.pause().unwrap();
            }
        }));

    let (tx, rx) = mpsc::channel();
    let tx = parking_lot::Mutex::new(tx);
    runner
        .hub()
        .add_lifecycle_listener(Arc::new(move |event: &LifecycleEvent| {
            let _ = tx.lock().send(event.status);
        }));

    (runner, rx)
}

fn wait_for(rx: &mpsc::Receiver<LifecycleStatus>, wanted: LifecycleStatus) {
    loop {
        let status = rx.recv_timeout(TIMEOUT).unwrap();
        if status == wanted {
            return;
        }
    }
}

fn five_samples() -> Vec<evalrig_core::Sample> {
    rating_samples(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0), (5.0, 5.0)])
}

#[test]
fn test_pause_halts_between_samples() {
    let (runner, rx) = pausing_runner(2);
    let log = EventLog::attach(runner.hub());
    let algorithm = EchoAlgorithm::new("A");

    runner
        .evaluate(algorithm.boxed(), pool_of(&[1], &five_samples()), Value::Null)
        .unwrap();
    wait_for(&rx, LifecycleStatus::Paused);

    assert!(runner.is_paused());
    assert!(runner.is_started());
    assert!(!runner.is_running());
    assert_eq!(log.progress().len(), 2);
    assert_eq!(algorithm.executes(), 2);

    // the worker stays blocked
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(algorithm.executes(), 2);

    runner.resume().unwrap();
    wait_for(&rx, LifecycleStatus::Done);
    runner.wait();

    let steps: Vec<usize> = log.progress().iter().map(|p| p.step).collect();
    assert_eq!(steps, vec![1, 2, 3, 4, 5]);
    assert_eq!(algorithm.executes(), 5);

    let statuses = log.statuses();
    let paused = statuses.iter().position(|s| *s == LifecycleStatus::Paused).unwrap();
    let resumed = statuses.iter().position(|s| *s == LifecycleStatus::Resumed).unwrap();
    assert!(paused < resumed);
    assert_eq!(runner.result_snapshot().summary("recall", "A", 1), Some(1.0));

    runner.close();
}

#[test]
fn test_start_rejected_while_paused() {
    let (runner, rx) = pausing_runner(1);
    let algorithm = EchoAlgorithm::new("A");

    runner
        .evaluate(algorithm.boxed(), pool_of(&[1], &five_samples()), Value::Null)
        .unwrap();
    wait_for(&rx, LifecycleStatus::Paused);

    let err = runner
        .evaluate(EchoAlgorithm::new("B").boxed(), pool_of(&[2], &five_samples()), Value::Null)
        .unwrap_err();
    assert_eq!(err, EvalError::AlreadyRunning);
    assert_eq!(runner.state(), RunnerState::Paused);
    assert!(runner.result_registry().get("mae", "B", 2).is_none());

    runner.close();
}

#[test]
fn test_stop_while_paused() {
    let (runner, rx) = pausing_runner(2);
    let log = EventLog::attach(runner.hub());
    let algorithm = EchoAlgorithm::new("A");

    runner
        .evaluate(algorithm.boxed(), pool_of(&[1, 2], &five_samples()), Value::Null)
        .unwrap();
    wait_for(&rx, LifecycleStatus::Paused);

    runner.stop();
    assert_eq!(runner.state(), RunnerState::Idle);
    assert_eq!(algorithm.executes(), 2);
    assert_eq!(algorithm.teardowns(), 1);

    let statuses = log.statuses();
    assert_eq!(
        &statuses[statuses.len() - 2..],
        &[LifecycleStatus::Stopped, LifecycleStatus::Done]
    );
    assert!(!statuses.contains(&LifecycleStatus::DoneOne));
    assert!(!statuses.contains(&LifecycleStatus::Resumed));

    // partial results survive the stop
    let snapshot = runner.result_snapshot();
    assert_eq!(snapshot.summary("mae", "A", 1), Some(0.0));
    assert_eq!(snapshot.summary("recall", "A", 1), None);
    assert!(snapshot.find("mae", "A", 2).is_some());

    runner.close();
}

#[test]
fn test_force_stop_signals_without_blocking() {
    let (runner, rx) = pausing_runner(1);
    let log = EventLog::attach(runner.hub());
    let algorithm = EchoAlgorithm::new("A");

    runner
        .evaluate(algorithm.boxed(), pool_of(&[1], &five_samples()), Value::Null)
        .unwrap();
    wait_for(&rx, LifecycleStatus::Paused);

    assert!(runner.force_stop());
    wait_for(&rx, LifecycleStatus::Done);
    runner.wait();

    assert!(!runner.is_started());
    assert_eq!(algorithm.executes(), 1);
    assert_eq!(log.statuses().last(), Some(&LifecycleStatus::Done));
    assert!(log.statuses().contains(&LifecycleStatus::Stopped));
    assert!(!runner.force_stop());

    runner.close();
}

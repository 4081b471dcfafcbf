//! The run loop
//!
//! Runs on a dedicated thread, strictly sequentially: algorithms in input
//! order, dataset pairs in pool order, samples in cursor order. Failures are
//! contained per algorithm x dataset unit.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use super::state::{Checkpoint, Control};
use crate::algorithm::Algorithm;
use crate::dataset::{Cursor, DatasetPair, DatasetPool, Sample};
use crate::error::{EvalError, EvalResult};
use crate::events::{
    panic_message, EventHub, LifecycleEvent, LifecycleStatus, ProgressEvent, SetupEvent,
};
use crate::metrics::builtin::{RecallMetric, SetupTimeMetric, SpeedMetric};
use crate::metrics::{
    MetricKind, MetricRegistry, MetricSelector, MetricValue, RecalcParams, RegistrySnapshot,
};

/// State shared by the runner handle and its worker
pub(crate) struct Shared {
    pub(crate) control: Control,
    pub(crate) registry: RwLock<MetricRegistry>,
    pub(crate) deferred: Mutex<Vec<Box<dyn Algorithm>>>,
    pub(crate) hub: Arc<EventHub>,
}

impl Shared {
    pub(crate) fn new(hub: Arc<EventHub>) -> Self {
        Self {
            control: Control::default(),
            registry: RwLock::new(MetricRegistry::new()),
            deferred: Mutex::new(Vec::new()),
            hub,
        }
    }

    /// Tear down every instance whose teardown was delayed
    pub(crate) fn run_deferred_teardown(&self) {
        let deferred = std::mem::take(&mut *self.deferred.lock());
        for mut algorithm in deferred {
            let name = algorithm.name().to_string();
            match guarded(&name, || algorithm.unsetup()) {
                Ok(()) => tracing::debug!(algorithm = %name, "deferred teardown done"),
                Err(e) => tracing::error!(algorithm = %name, error = %e, "deferred teardown failed"),
            }
        }
    }

    fn recalc(
        &self,
        algorithm: &str,
        dataset_id: u32,
        selector: &MetricSelector,
        params: &RecalcParams<'_>,
    ) -> RegistrySnapshot {
        let mut registry = self.registry.write();
        let updated = registry.recalc_in_place(algorithm, dataset_id, selector, params);
        registry.light_snapshot_at(&updated)
    }
}

/// Everything one run needs, moved onto the worker thread
pub(crate) struct RunPlan {
    pub(crate) algorithms: Vec<Box<dyn Algorithm>>,
    pub(crate) pool: DatasetPool,
    pub(crate) extra: serde_json::Value,
    pub(crate) delay_teardown: bool,
}

/// How a unit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitOutcome {
    Completed,
    Failed,
    Stopped,
}

/// Position of the current unit, for progress events
#[derive(Debug, Clone, Copy)]
struct Position {
    algorithm_index: usize,
    algorithm_count: usize,
    dataset_index: usize,
    dataset_count: usize,
}

/// Worker entry point. Always leaves the control state idle.
pub(crate) fn run(shared: Arc<Shared>, plan: RunPlan) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run_loop(&shared, &plan)));
    if let Err(payload) = outcome {
        tracing::error!(panic = %panic_message(payload.as_ref()), "evaluation worker panicked");
    }
    shared.control.finish();
}

fn run_loop(shared: &Shared, plan: &RunPlan) {
    let hub = &shared.hub;
    tracing::info!(
        algorithms = plan.algorithms.len(),
        datasets = plan.pool.len(),
        "evaluation started"
    );
    hub.emit_lifecycle(LifecycleEvent::run(
        LifecycleStatus::Started,
        RegistrySnapshot::default(),
    ));

    let algorithm_count = plan.algorithms.len();
    let dataset_count = plan.pool.len();
    let mut stopped = false;

    'algorithms: for (algorithm_index, algorithm) in plan.algorithms.iter().enumerate() {
        for (dataset_index, pair) in plan.pool.iter().enumerate() {
            if shared.control.stop_requested() {
                stopped = true;
                break 'algorithms;
            }
            let position = Position {
                algorithm_index,
                algorithm_count,
                dataset_index,
                dataset_count,
            };
            let outcome = run_unit(shared, plan, algorithm.as_ref(), pair, position);
            if outcome == UnitOutcome::Stopped {
                stopped = true;
                break 'algorithms;
            }
        }
    }

    let snapshot = shared.registry.read().snapshot();
    if stopped || shared.control.stop_requested() {
        tracing::info!("evaluation stopped");
        hub.emit_lifecycle(LifecycleEvent::run(LifecycleStatus::Stopped, snapshot.clone()));
        shared.run_deferred_teardown();
    } else {
        tracing::info!("evaluation finished");
    }
    hub.emit_lifecycle(LifecycleEvent::run(LifecycleStatus::Done, snapshot));
}

fn run_unit(
    shared: &Shared,
    plan: &RunPlan,
    template: &dyn Algorithm,
    pair: &DatasetPair,
    position: Position,
) -> UnitOutcome {
    let hub = &shared.hub;
    let name = template.name().to_string();
    let dataset_id = pair.id;
    let mut instance = template.new_instance();
    let delay_teardown = plan.delay_teardown || instance.config().delay_teardown;

    let span = tracing::info_span!("unit", algorithm = %name, dataset_id);
    let _entered = span.enter();

    // setup
    hub.emit_setup(SetupEvent::doing(&name, dataset_id));
    let started = Instant::now();
    let setup = guarded(&name, || instance.setup(pair.training.as_ref(), &plan.extra));
    let elapsed = started.elapsed().as_secs_f64();

    let set_up = setup.is_ok();
    let outcome = match setup {
        Ok(()) => {
            let batch = shared.recalc(
                &name,
                dataset_id,
                &MetricSelector::class::<SetupTimeMetric>(),
                &RecalcParams::Elapsed(elapsed),
            );
            hub.emit_lifecycle(LifecycleEvent::unit(
                LifecycleStatus::Doing,
                &name,
                dataset_id,
                batch,
            ));
            hub.emit_setup(SetupEvent::done(&name, dataset_id, Some(elapsed)));

            match run_test_set(shared, &name, instance.as_mut(), pair, position) {
                Ok(()) => UnitOutcome::Completed,
                Err(EvalError::Cancelled) => UnitOutcome::Stopped,
                Err(e) => {
                    tracing::error!(error = %e, "test set evaluation failed");
                    UnitOutcome::Failed
                }
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "algorithm setup failed");
            hub.emit_setup(SetupEvent::done(&name, dataset_id, None));
            UnitOutcome::Failed
        }
    };

    if outcome != UnitOutcome::Stopped {
        let unit = shared.registry.read().unit_snapshot(&name, dataset_id);
        hub.emit_lifecycle(LifecycleEvent::unit(
            LifecycleStatus::DoneOne,
            &name,
            dataset_id,
            unit,
        ));
    }

    if !set_up {
        tracing::debug!("teardown skipped, setup did not complete");
    } else if delay_teardown {
        tracing::debug!("teardown deferred");
        shared.deferred.lock().push(instance);
    } else if let Err(e) = guarded(&name, || instance.unsetup()) {
        tracing::error!(error = %e, "algorithm teardown failed");
    }

    outcome
}

fn run_test_set(
    shared: &Shared,
    name: &str,
    instance: &mut dyn Algorithm,
    pair: &DatasetPair,
    position: Position,
) -> EvalResult<()> {
    let hub = &shared.hub;
    let dataset_id = pair.id;
    let cursor = pair.testing.fetch().map_err(|e| {
        EvalError::dataset_with_id(format!("testing set unavailable: {}", e), dataset_id)
    })?;
    let mut cursor = CursorGuard::new(cursor);
    let total = cursor.size();
    let mut step = 0;
    let mut executed = 0usize;

    loop {
        if wait_at_boundary(shared, name, dataset_id) {
            return Err(EvalError::Cancelled);
        }
        let Some(sample) = cursor.next_sample()? else {
            break;
        };
        step += 1;

        hub.emit_progress(ProgressEvent {
            algorithm: name.to_string(),
            dataset_id,
            algorithm_index: position.algorithm_index,
            algorithm_count: position.algorithm_count,
            dataset_index: position.dataset_index,
            dataset_count: position.dataset_count,
            step,
            total,
            timestamp: chrono::Utc::now(),
        });

        let started = Instant::now();
        let output = guarded(name, || instance.execute(&sample.input));
        let elapsed = started.elapsed().as_secs_f64();

        let batch = shared.recalc(
            name,
            dataset_id,
            &MetricSelector::class::<SpeedMetric>(),
            &RecalcParams::Elapsed(elapsed),
        );
        hub.emit_lifecycle(LifecycleEvent::unit(
            LifecycleStatus::Doing,
            name,
            dataset_id,
            batch,
        ));

        let Some(result) = output? else {
            tracing::trace!(step, "no result");
            continue;
        };
        executed += 1;
        let batch = match &sample.expected {
            Some(expected) => shared.recalc(
                name,
                dataset_id,
                &MetricSelector::Kind(MetricKind::Accuracy),
                &RecalcParams::Pair {
                    computed: &result,
                    expected,
                },
            ),
            None => RegistrySnapshot::default(),
        };
        hub.emit_lifecycle(
            LifecycleEvent::unit(LifecycleStatus::Doing, name, dataset_id, batch)
                .with_outcome(result, sample.expected.clone()),
        );
    }

    let recall = MetricValue::fraction(executed as f64, total as f64);
    let batch = shared.recalc(
        name,
        dataset_id,
        &MetricSelector::class::<RecallMetric>(),
        &RecalcParams::Value(&recall),
    );
    hub.emit_lifecycle(LifecycleEvent::unit(
        LifecycleStatus::Doing,
        name,
        dataset_id,
        batch,
    ));
    tracing::debug!(executed, total, "test set done");

    Ok(())
}

/// Sample boundary: honour stop and pause. Returns `true` to abandon the run.
fn wait_at_boundary(shared: &Shared, name: &str, dataset_id: u32) -> bool {
    match shared.control.checkpoint() {
        Checkpoint::Continue => false,
        Checkpoint::Stop => true,
        Checkpoint::Pause => {
            let hub = &shared.hub;
            tracing::info!("evaluation paused");
            hub.emit_lifecycle(LifecycleEvent::unit(
                LifecycleStatus::Paused,
                name,
                dataset_id,
                RegistrySnapshot::default(),
            ));
            if shared.control.wait_while_paused() {
                return true;
            }
            tracing::info!("evaluation resumed");
            hub.emit_lifecycle(LifecycleEvent::unit(
                LifecycleStatus::Resumed,
                name,
                dataset_id,
                RegistrySnapshot::default(),
            ));
            false
        }
    }
}

/// Run algorithm code, turning a panic into an algorithm error
fn guarded<T>(algorithm: &str, call: impl FnOnce() -> EvalResult<T>) -> EvalResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => Err(EvalError::algorithm(
            algorithm,
            format!("panicked: {}", panic_message(payload.as_ref())),
        )),
    }
}

/// Closes the cursor on every exit path
struct CursorGuard {
    cursor: Box<dyn Cursor>,
}

impl CursorGuard {
    fn new(cursor: Box<dyn Cursor>) -> Self {
        Self { cursor }
    }

    fn size(&self) -> usize {
        self.cursor.size()
    }

    fn next_sample(&mut self) -> EvalResult<Option<Sample>> {
        self.cursor.next_sample()
    }
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        self.cursor.close();
    }
}

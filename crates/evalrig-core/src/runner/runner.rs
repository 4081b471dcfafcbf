//! Runner handle: control surface and result access

use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use super::state::RunnerState;
use super::worker::{self, RunPlan, Shared};
use crate::algorithm::Algorithm;
use crate::config::EvalConfig;
use crate::dataset::DatasetPool;
use crate::error::{EvalError, EvalResult};
use crate::events::EventHub;
use crate::metrics::{metrics_by_names, Metric, MetricRegistry, RegistrySnapshot};

/// Drives algorithms over a dataset pool on a dedicated worker thread.
///
/// At most one run is active at a time. Control calls (`pause`, `resume`,
/// `stop`, `force_stop`) take effect at the next sample boundary; an
/// in-flight algorithm call is never interrupted.
pub struct EvaluationRunner {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    templates: Vec<Box<dyn Metric>>,
    config: EvalConfig,
}

impl EvaluationRunner {
    /// Create a runner with its own event hub
    pub fn new(config: EvalConfig) -> EvalResult<Self> {
        let hub = Arc::new(EventHub::new(config.events.clone()));
        Self::with_hub(config, hub)
    }

    /// Create a runner reporting through `hub`
    pub fn with_hub(config: EvalConfig, hub: Arc<EventHub>) -> EvalResult<Self> {
        config.validate()?;
        let templates = metrics_by_names(config.metrics.as_slice())?;
        Ok(Self {
            shared: Arc::new(Shared::new(hub)),
            worker: Mutex::new(None),
            templates,
            config,
        })
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.shared.hub
    }

    /// Start evaluating `algorithms` over every pair of `pool`.
    ///
    /// Rejected with [`EvalError::AlreadyRunning`] while a run is started;
    /// the running evaluation is left untouched. Deferred teardowns of the
    /// previous run execute before the new run starts.
    pub fn evaluate(
        &self,
        algorithms: Vec<Box<dyn Algorithm>>,
        pool: DatasetPool,
        extra: serde_json::Value,
    ) -> EvalResult<()> {
        if self.state().is_started() {
            return Err(EvalError::AlreadyRunning);
        }
        if algorithms.is_empty() {
            return Err(EvalError::invalid_field("algorithms", "No algorithm to evaluate"));
        }
        if pool.is_empty() {
            return Err(EvalError::invalid_field("pool", "Dataset pool is empty"));
        }
        let mut names = HashSet::new();
        if let Some(duplicate) = algorithms.iter().find(|a| !names.insert(a.name().to_string())) {
            return Err(EvalError::invalid_field(
                "algorithms",
                format!("Duplicate algorithm name: {}", duplicate.name()),
            ));
        }

        self.shared.control.try_start()?;
        self.reap_worker();
        self.shared.run_deferred_teardown();

        {
            let mut registry = self.shared.registry.write();
            registry.clear();
            for algorithm in &algorithms {
                for pair in pool.iter() {
                    registry.populate(
                        &self.templates,
                        algorithm.name(),
                        pair.id,
                        pair.locator().as_deref(),
                    );
                }
            }
        }

        let plan = RunPlan {
            algorithms,
            pool,
            extra,
            delay_teardown: self.config.delay_teardown,
        };
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("evalrig-worker".to_string())
            .spawn(move || worker::run(shared, plan))
            .map_err(|e| {
                self.shared.control.finish();
                EvalError::io(format!("Failed to spawn evaluation worker: {}", e))
            })?;
        *self.worker.lock() = Some(handle);
        Ok(())
    }

    /// Halt at the next sample boundary
    pub fn pause(&self) -> EvalResult<()> {
        self.shared.control.pause()?;
        tracing::debug!("pause requested");
        Ok(())
    }

    /// Continue a paused run
    pub fn resume(&self) -> EvalResult<()> {
        self.shared.control.resume()?;
        tracing::debug!("resume requested");
        Ok(())
    }

    /// Abandon the run and block until the worker has exited, then run
    /// deferred teardowns. Safe to call when idle.
    pub fn stop(&self) {
        if self.shared.control.request_stop() {
            tracing::info!("stop requested");
        }
        self.wait();
        self.reap_worker();
        self.shared.run_deferred_teardown();
    }

    /// Signal abandonment without waiting. Returns whether a run was started.
    pub fn force_stop(&self) -> bool {
        let signalled = self.shared.control.request_stop();
        if signalled {
            tracing::info!("force stop requested");
        }
        signalled
    }

    /// Block until the current run, if any, has finished
    pub fn wait(&self) {
        if self.on_worker_thread() {
            return;
        }
        self.shared.control.wait_idle();
    }

    /// Stop, tear everything down and close the event hub
    pub fn close(&self) {
        self.stop();
        self.shared.hub.close();
        tracing::debug!("runner closed");
    }

    pub fn state(&self) -> RunnerState {
        self.shared.control.state()
    }

    /// Running or paused
    pub fn is_started(&self) -> bool {
        self.state().is_started()
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunnerState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state() == RunnerState::Paused
    }

    /// Copy of the current (or last) run's registry
    pub fn result_registry(&self) -> MetricRegistry {
        self.shared.registry.read().clone()
    }

    /// Serializable view of the current (or last) run's registry
    pub fn result_snapshot(&self) -> RegistrySnapshot {
        self.shared.registry.read().snapshot()
    }

    /// Number of algorithm instances waiting for teardown
    pub fn deferred_teardowns(&self) -> usize {
        self.shared.deferred.lock().len()
    }

    fn on_worker_thread(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|h| h.thread().id() == thread::current().id())
    }

    /// Join a worker that has already finished
    fn reap_worker(&self) {
        if self.on_worker_thread() {
            return;
        }
        let handle = {
            let mut worker = self.worker.lock();
            match worker.as_ref() {
                Some(h) if h.is_finished() => worker.take(),
                _ => None,
            }
        };
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("evaluation worker terminated abnormally");
            }
        }
    }
}

impl Drop for EvaluationRunner {
    fn drop(&mut self) {
        // A started worker tears deferred instances down on its way out
        if !self.shared.control.request_stop() {
            self.shared.run_deferred_teardown();
        }
    }
}

impl std::fmt::Debug for EvaluationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationRunner")
            .field("state", &self.state())
            .field("metrics", &self.config.metrics)
            .finish()
    }
}

//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use evalrig_core::{
    Algorithm, AlgorithmConfig, Dataset, DatasetPair, DatasetPool, EvalResult, EvaluationEvent,
    EventHub, LifecycleEvent, LifecycleListener, LifecycleStatus, MemoryDataset, Prediction,
    ProgressEvent, ProgressListener, Sample, SetupEvent, SetupListener,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Predicts the numeric input as a rating
#[derive(Debug, Clone)]
pub struct EchoAlgorithm {
    pub name: String,
    pub executes: Arc<AtomicUsize>,
    pub teardowns: Arc<AtomicUsize>,
}

impl EchoAlgorithm {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            executes: Arc::new(AtomicUsize::new(0)),
            teardowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn executes(&self) -> usize {
        self.executes.load(Ordering::SeqCst)
    }

    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }

    pub fn boxed(&self) -> Vec<Box<dyn Algorithm>> {
        vec![Box::new(self.clone())]
    }
}

impl Algorithm for EchoAlgorithm {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> AlgorithmConfig {
        AlgorithmConfig::default()
    }

    fn new_instance(&self) -> Box<dyn Algorithm> {
        Box::new(self.clone())
    }

    fn setup(&mut self, _training: &dyn Dataset, _extra: &Value) -> EvalResult<()> {
        Ok(())
    }

    fn execute(&mut self, input: &Value) -> EvalResult<Option<Prediction>> {
        self.executes.fetch_add(1, Ordering::SeqCst);
        Ok(input.as_f64().map(Prediction::Rating))
    }

    fn unsetup(&mut self) -> EvalResult<()> {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Samples `(input, expected)` as rating pairs
pub fn rating_samples(pairs: &[(f64, f64)]) -> Vec<Sample> {
    pairs
        .iter()
        .map(|(input, expected)| Sample::labeled(json!(input), Prediction::Rating(*expected)))
        .collect()
}

/// Pool with one pair per id, every testing side holding `samples`
pub fn pool_of(ids: &[u32], samples: &[Sample]) -> DatasetPool {
    let mut pool = DatasetPool::new();
    for id in ids {
        pool.add(DatasetPair::new(
            *id,
            Arc::new(MemoryDataset::new(*id, samples.to_vec())),
            Arc::new(
                MemoryDataset::new(*id, samples.to_vec()).with_locator(format!("mem://{}", id)),
            ),
        ))
        .unwrap();
    }
    pool
}

/// Records every event of every channel in emission order
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<EvaluationEvent>>,
}

impl EventLog {
    pub fn attach(hub: &EventHub) -> Arc<Self> {
        let log = Arc::new(Self::default());
        hub.add_lifecycle_listener(log.clone());
        hub.add_progress_listener(log.clone());
        hub.add_setup_listener(log.clone());
        log
    }

    pub fn events(&self) -> Vec<EvaluationEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn progress(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                EvaluationEvent::Progress(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn setup(&self) -> Vec<SetupEvent> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                EvaluationEvent::Setup(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn lifecycle(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| e.as_lifecycle().cloned())
            .collect()
    }

    pub fn statuses(&self) -> Vec<LifecycleStatus> {
        self.lifecycle().iter().map(|e| e.status).collect()
    }
}

impl LifecycleListener for EventLog {
    fn on_lifecycle(&self, event: &LifecycleEvent) {
        self.events
            .lock()
            .push(EvaluationEvent::Lifecycle(event.clone()));
    }
}

impl ProgressListener for EventLog {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events.lock().push(EvaluationEvent::Progress(event.clone()));
    }
}

impl SetupListener for EventLog {
    fn on_setup(&self, event: &SetupEvent) {
        self.events.lock().push(EvaluationEvent::Setup(event.clone()));
    }
}

//! Event hub
//!
//! Local listeners are called synchronously, in registration order, on the
//! emitting thread. Every event is also appended to a bounded queue per
//! remote listener id; remote observers pull with [`EventHub::drain_events`].

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use super::listener::{LifecycleListener, ListenerProbe, ProgressListener, SetupListener};
use super::remote::{RemoteListenerStatus, RemoteSlot};
use super::types::{EvaluationEvent, LifecycleEvent, ProgressEvent, SetupEvent};
use crate::config::EventsConfig;
use crate::error::{EvalError, EvalResult};

/// Dual push/pull event distribution for one runner
pub struct EventHub {
    lifecycle: RwLock<Vec<Arc<dyn LifecycleListener>>>,
    progress: RwLock<Vec<Arc<dyn ProgressListener>>>,
    setup: RwLock<Vec<Arc<dyn SetupListener>>>,
    remote: Mutex<HashMap<String, RemoteSlot>>,
    config: EventsConfig,
}

impl EventHub {
    pub fn new(config: EventsConfig) -> Self {
        Self {
            lifecycle: RwLock::new(Vec::new()),
            progress: RwLock::new(Vec::new()),
            setup: RwLock::new(Vec::new()),
            remote: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &EventsConfig {
        &self.config
    }

    // ========== Local listeners ==========

    pub fn add_lifecycle_listener(&self, listener: Arc<dyn LifecycleListener>) {
        self.lifecycle.write().push(listener);
    }

    pub fn add_progress_listener(&self, listener: Arc<dyn ProgressListener>) {
        self.progress.write().push(listener);
    }

    pub fn add_setup_listener(&self, listener: Arc<dyn SetupListener>) {
        self.setup.write().push(listener);
    }

    pub fn remove_lifecycle_listener(&self, listener: &Arc<dyn LifecycleListener>) -> bool {
        remove_by_ptr(&mut self.lifecycle.write(), listener)
    }

    pub fn remove_progress_listener(&self, listener: &Arc<dyn ProgressListener>) -> bool {
        remove_by_ptr(&mut self.progress.write(), listener)
    }

    pub fn remove_setup_listener(&self, listener: &Arc<dyn SetupListener>) -> bool {
        remove_by_ptr(&mut self.setup.write(), listener)
    }

    /// Number of local listeners over all three channels
    pub fn local_listener_count(&self) -> usize {
        self.lifecycle.read().len() + self.progress.read().len() + self.setup.read().len()
    }

    // ========== Emission ==========

    pub fn emit_lifecycle(&self, event: LifecycleEvent) {
        let listeners = self.lifecycle.read().clone();
        for listener in &listeners {
            deliver("lifecycle", || listener.on_lifecycle(&event));
        }
        self.enqueue(EvaluationEvent::Lifecycle(event));
    }

    pub fn emit_progress(&self, event: ProgressEvent) {
        let listeners = self.progress.read().clone();
        for listener in &listeners {
            deliver("progress", || listener.on_progress(&event));
        }
        self.enqueue(EvaluationEvent::Progress(event));
    }

    pub fn emit_setup(&self, event: SetupEvent) {
        let listeners = self.setup.read().clone();
        for listener in &listeners {
            deliver("setup", || listener.on_setup(&event));
        }
        self.enqueue(EvaluationEvent::Setup(event));
    }

    fn enqueue(&self, event: EvaluationEvent) {
        let mut remote = self.remote.lock();
        for (id, slot) in remote.iter_mut() {
            if slot.push(event.clone()) {
                tracing::warn!(
                    listener_id = %id,
                    dropped = slot.dropped(),
                    "remote queue full, dropped oldest event"
                );
            }
        }
    }

    // ========== Remote listeners ==========

    /// Register a remote listener id, generating one when absent. Registering
    /// an id that already exists keeps its queue.
    pub fn register_remote(&self, listener_id: Option<String>) -> String {
        self.register(listener_id, None)
    }

    /// Register a remote listener id checked by `probe` on every sweep
    pub fn register_remote_with_probe(
        &self,
        listener_id: Option<String>,
        probe: Arc<dyn ListenerProbe>,
    ) -> String {
        self.register(listener_id, Some(probe))
    }

    fn register(&self, listener_id: Option<String>, probe: Option<Arc<dyn ListenerProbe>>) -> String {
        let id = listener_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut remote = self.remote.lock();
        match remote.get_mut(&id) {
            Some(slot) => {
                if probe.is_some() {
                    slot.probe = probe;
                }
            }
            None => {
                remote.insert(id.clone(), RemoteSlot::new(self.config.queue_capacity, probe));
                tracing::info!(listener_id = %id, "remote listener registered");
            }
        }
        id
    }

    /// Remove a remote listener and discard its queue
    pub fn unregister_remote(&self, listener_id: &str) -> bool {
        let removed = self.remote.lock().remove(listener_id).is_some();
        if removed {
            tracing::info!(listener_id = %listener_id, "remote listener unregistered");
        }
        removed
    }

    /// Atomically take and clear the pending events of a remote listener
    pub fn drain_events(&self, listener_id: &str) -> EvalResult<Vec<EvaluationEvent>> {
        self.remote
            .lock()
            .get_mut(listener_id)
            .map(RemoteSlot::drain)
            .ok_or_else(|| EvalError::UnknownListener(listener_id.to_string()))
    }

    pub fn remote_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.remote.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_registered(&self, listener_id: &str) -> bool {
        self.remote.lock().contains_key(listener_id)
    }

    pub fn remote_status(&self, listener_id: &str) -> Option<RemoteListenerStatus> {
        self.remote.lock().get(listener_id).map(|slot| RemoteListenerStatus {
            listener_id: listener_id.to_string(),
            pending: slot.pending(),
            dropped: slot.dropped(),
            failures: slot.failures,
            probed: slot.probe.is_some(),
        })
    }

    /// Check every remote listener once and deregister those that failed
    /// `max_probe_failures` consecutive sweeps. Returns the removed ids.
    ///
    /// A listener with a probe fails when the probe says so. A listener
    /// without one fails when events are pending and it has not drained
    /// since the previous sweep.
    pub fn sweep_once(&self) -> Vec<String> {
        let probes: Vec<(String, Arc<dyn ListenerProbe>)> = self
            .remote
            .lock()
            .iter()
            .filter_map(|(id, slot)| slot.probe.clone().map(|p| (id.clone(), p)))
            .collect();

        // probes may block, so they run without the lock
        let probed: HashMap<String, bool> = probes
            .into_iter()
            .map(|(id, probe)| {
                let alive = panic::catch_unwind(AssertUnwindSafe(|| probe.probe(&id)))
                    .unwrap_or(false);
                (id, alive)
            })
            .collect();

        let mut remote = self.remote.lock();
        let mut removed = Vec::new();
        for (id, slot) in remote.iter_mut() {
            let alive = match probed.get(id) {
                Some(alive) if slot.probe.is_some() => *alive,
                _ => slot.looks_alive(),
            };
            slot.drained_since_sweep = false;
            if alive {
                slot.failures = 0;
                continue;
            }
            slot.failures += 1;
            tracing::debug!(listener_id = %id, failures = slot.failures, "remote listener check failed");
            if slot.failures >= self.config.max_probe_failures {
                removed.push(id.clone());
            }
        }
        for id in &removed {
            remote.remove(id);
            tracing::warn!(listener_id = %id, "remote listener deregistered after failed checks");
        }
        removed
    }

    /// Drop every listener and discard every remote queue
    pub fn close(&self) {
        self.lifecycle.write().clear();
        self.progress.write().clear();
        self.setup.write().clear();
        let discarded = {
            let mut remote = self.remote.lock();
            let count = remote.len();
            remote.clear();
            count
        };
        tracing::debug!(remote_listeners = discarded, "event hub closed");
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(EventsConfig::default())
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("local_listeners", &self.local_listener_count())
            .field("remote_listeners", &self.remote.lock().len())
            .field("config", &self.config)
            .finish()
    }
}

fn remove_by_ptr<T: ?Sized>(listeners: &mut Vec<Arc<T>>, target: &Arc<T>) -> bool {
    let before = listeners.len();
    listeners.retain(|l| !Arc::ptr_eq(l, target));
    listeners.len() != before
}

/// Call a local listener, containing any panic it raises
fn deliver(channel: &'static str, call: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(call)) {
        tracing::warn!(
            channel,
            panic = %panic_message(payload.as_ref()),
            "listener panicked, continuing delivery"
        );
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

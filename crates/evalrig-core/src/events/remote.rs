//! Pull-based delivery for remote observers

use std::collections::VecDeque;
use std::sync::Arc;

use super::listener::ListenerProbe;
use super::types::EvaluationEvent;

/// Bounded queue of one remote listener id
pub(crate) struct RemoteSlot {
    queue: VecDeque<EvaluationEvent>,
    capacity: usize,
    pub(crate) probe: Option<Arc<dyn ListenerProbe>>,
    pub(crate) failures: u32,
    pub(crate) drained_since_sweep: bool,
    dropped: u64,
}

impl RemoteSlot {
    pub(crate) fn new(capacity: usize, probe: Option<Arc<dyn ListenerProbe>>) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity: capacity.max(1),
            probe,
            failures: 0,
            drained_since_sweep: false,
            dropped: 0,
        }
    }

    /// Append an event, dropping the oldest past capacity. Returns whether an
    /// event was dropped.
    pub(crate) fn push(&mut self, event: EvaluationEvent) -> bool {
        let overflow = self.queue.len() >= self.capacity;
        if overflow {
            self.queue.pop_front();
            self.dropped += 1;
        }
        self.queue.push_back(event);
        overflow
    }

    /// Take every pending event
    pub(crate) fn drain(&mut self) -> Vec<EvaluationEvent> {
        self.drained_since_sweep = true;
        self.failures = 0;
        self.queue.drain(..).collect()
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Liveness as seen without a probe: nothing pending, or drained since
    /// the previous sweep
    pub(crate) fn looks_alive(&self) -> bool {
        self.queue.is_empty() || self.drained_since_sweep
    }
}

/// Status of a remote listener, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RemoteListenerStatus {
    pub listener_id: String,
    pub pending: usize,
    pub dropped: u64,
    pub failures: u32,
    pub probed: bool,
}

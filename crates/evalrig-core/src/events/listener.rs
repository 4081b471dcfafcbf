//! Listener traits

use super::types::{LifecycleEvent, ProgressEvent, SetupEvent};

/// Local observer of lifecycle events
pub trait LifecycleListener: Send + Sync {
    fn on_lifecycle(&self, event: &LifecycleEvent);
}

/// Local observer of progress events
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Local observer of setup events
pub trait SetupListener: Send + Sync {
    fn on_setup(&self, event: &SetupEvent);
}

impl<F> LifecycleListener for F
where
    F: Fn(&LifecycleEvent) + Send + Sync,
{
    fn on_lifecycle(&self, event: &LifecycleEvent) {
        self(event)
    }
}

impl<F> ProgressListener for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

impl<F> SetupListener for F
where
    F: Fn(&SetupEvent) + Send + Sync,
{
    fn on_setup(&self, event: &SetupEvent) {
        self(event)
    }
}

/// Liveness check for a remote listener id, run by the sweep
#[cfg_attr(test, mockall::automock)]
pub trait ListenerProbe: Send + Sync {
    /// Whether the remote observer behind `listener_id` is still reachable
    fn probe(&self, listener_id: &str) -> bool;
}

//! Evaluation events
//!
//! The runner reports through three channels (lifecycle, progress, setup).
//! Local listeners are pushed to; remote observers pull from bounded
//! per-listener queues and are dropped by a periodic sweep once they stop
//! responding.

mod hub;
mod listener;
mod remote;
mod sweeper;
mod types;


pub use hub::EventHub;
pub(crate) use hub::panic_message;
pub use listener::{LifecycleListener, ListenerProbe, ProgressListener, SetupListener};
pub use remote::RemoteListenerStatus;
pub use types::{
    EvaluationEvent, LifecycleEvent, LifecycleStatus, ProgressEvent, SetupEvent, SetupStatus,
};

#[cfg(test)]
pub use listener::MockListenerProbe;

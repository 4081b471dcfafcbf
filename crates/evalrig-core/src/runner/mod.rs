//! Evaluation runner
//!
//! [`EvaluationRunner`] owns the control state machine
//! (Idle -> Running <-> Paused -> Idle), the result registry and the event
//! hub. The run loop itself lives in the worker module.

mod runner;
mod state;
mod worker;

#[cfg(test)]
mod tests;

pub use runner::EvaluationRunner;
pub use state::RunnerState;

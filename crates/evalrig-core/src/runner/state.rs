//! Run control shared between the runner handle and its worker

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};

/// Execution state of a runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerState {
    #[default]
    Idle,
    Running,
    Paused,
}

impl RunnerState {
    pub fn is_started(&self) -> bool {
        matches!(self, RunnerState::Running | RunnerState::Paused)
    }
}

#[derive(Debug, Default)]
struct ControlState {
    state: RunnerState,
    stop_requested: bool,
}

/// What the worker should do at a sample boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Checkpoint {
    Continue,
    Pause,
    Stop,
}

/// State machine plus the condition variables the worker blocks on
#[derive(Debug, Default)]
pub(crate) struct Control {
    inner: Mutex<ControlState>,
    /// Signalled on resume and stop
    gate: Condvar,
    /// Signalled when the worker returns to idle
    finished: Condvar,
}

impl Control {
    pub(crate) fn state(&self) -> RunnerState {
        self.inner.lock().state
    }

    /// Idle -> Running; any other state rejects the start untouched
    pub(crate) fn try_start(&self) -> EvalResult<()> {
        let mut inner = self.inner.lock();
        if inner.state.is_started() {
            return Err(EvalError::AlreadyRunning);
        }
        inner.state = RunnerState::Running;
        inner.stop_requested = false;
        Ok(())
    }

    pub(crate) fn pause(&self) -> EvalResult<()> {
        let mut inner = self.inner.lock();
        match inner.state {
            RunnerState::Idle => Err(EvalError::NotRunning),
            RunnerState::Running | RunnerState::Paused => {
                inner.state = RunnerState::Paused;
                Ok(())
            }
        }
    }

    /// Paused -> Running, waking the worker
    pub(crate) fn resume(&self) -> EvalResult<()> {
        let mut inner = self.inner.lock();
        match inner.state {
            RunnerState::Idle => Err(EvalError::NotRunning),
            RunnerState::Running => Ok(()),
            RunnerState::Paused => {
                inner.state = RunnerState::Running;
                self.gate.notify_one();
                Ok(())
            }
        }
    }

    /// Ask the worker to abandon the run; returns whether a run was started
    pub(crate) fn request_stop(&self) -> bool {
        let mut inner = self.inner.lock();
        if !inner.state.is_started() {
            return false;
        }
        inner.stop_requested = true;
        self.gate.notify_all();
        true
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.inner.lock().stop_requested
    }

    /// Non-blocking look at the boundary
    pub(crate) fn checkpoint(&self) -> Checkpoint {
        let inner = self.inner.lock();
        if inner.stop_requested {
            Checkpoint::Stop
        } else if inner.state == RunnerState::Paused {
            Checkpoint::Pause
        } else {
            Checkpoint::Continue
        }
    }

    /// Block while paused. Returns `true` when woken by a stop request.
    pub(crate) fn wait_while_paused(&self) -> bool {
        let mut inner = self.inner.lock();
        while inner.state == RunnerState::Paused && !inner.stop_requested {
            self.gate.wait(&mut inner);
        }
        inner.stop_requested
    }

    /// Worker exit: back to idle, waking every waiter
    pub(crate) fn finish(&self) {
        let mut inner = self.inner.lock();
        inner.state = RunnerState::Idle;
        self.finished.notify_all();
    }

    /// Block until the worker is idle
    pub(crate) fn wait_idle(&self) {
        let mut inner = self.inner.lock();
        while inner.state.is_started() {
            self.finished.wait(&mut inner);
        }
    }
}

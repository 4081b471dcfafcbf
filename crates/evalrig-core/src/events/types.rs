//! Event payloads
//!
//! Every event is an immutable snapshot: it owns plain data only, so it can be
//! queued for remote listeners and serialized as is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::Prediction;
use crate::metrics::RegistrySnapshot;

/// Setup phase of one algorithm x dataset unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStatus {
    Doing,
    Done,
}

/// Run-level status carried by lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    /// The worker began the run
    Started,
    /// Metrics of the current unit changed
    Doing,
    /// One algorithm x dataset unit finished
    DoneOne,
    /// The worker blocked at a sample boundary
    Paused,
    /// The worker woke up after a pause
    Resumed,
    /// The run was abandoned; `Done` follows
    Stopped,
    /// The run ended
    Done,
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Started => "started",
            LifecycleStatus::Doing => "doing",
            LifecycleStatus::DoneOne => "done_one",
            LifecycleStatus::Paused => "paused",
            LifecycleStatus::Resumed => "resumed",
            LifecycleStatus::Stopped => "stopped",
            LifecycleStatus::Done => "done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupEvent {
    pub status: SetupStatus,
    pub algorithm: String,
    pub dataset_id: u32,
    /// Seconds spent in setup, on `Done`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_secs: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl SetupEvent {
    pub fn doing(algorithm: impl Into<String>, dataset_id: u32) -> Self {
        Self {
            status: SetupStatus::Doing,
            algorithm: algorithm.into(),
            dataset_id,
            elapsed_secs: None,
            timestamp: Utc::now(),
        }
    }

    pub fn done(algorithm: impl Into<String>, dataset_id: u32, elapsed_secs: Option<f64>) -> Self {
        Self {
            status: SetupStatus::Done,
            algorithm: algorithm.into(),
            dataset_id,
            elapsed_secs,
            timestamp: Utc::now(),
        }
    }
}

/// Position of the run loop, emitted before each test sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub algorithm: String,
    pub dataset_id: u32,
    /// Zero-based index of the algorithm
    pub algorithm_index: usize,
    pub algorithm_count: usize,
    /// Zero-based index of the dataset pair
    pub dataset_index: usize,
    pub dataset_count: usize,
    /// One-based sample number within the test set
    pub step: usize,
    pub total: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub status: LifecycleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<u32>,
    /// Metrics relevant to the event: the batch just recalculated, the unit
    /// on `DoneOne`, or the whole registry on `Done`
    pub metrics: RegistrySnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Prediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Prediction>,
    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    /// Run-level event without unit identity
    pub fn run(status: LifecycleStatus, metrics: RegistrySnapshot) -> Self {
        Self {
            status,
            algorithm: None,
            dataset_id: None,
            metrics,
            result: None,
            expected: None,
            timestamp: Utc::now(),
        }
    }

    /// Event about one algorithm x dataset unit
    pub fn unit(
        status: LifecycleStatus,
        algorithm: impl Into<String>,
        dataset_id: u32,
        metrics: RegistrySnapshot,
    ) -> Self {
        Self {
            algorithm: Some(algorithm.into()),
            dataset_id: Some(dataset_id),
            ..Self::run(status, metrics)
        }
    }

    /// Attach the outcome pair that triggered the recalculation
    pub fn with_outcome(mut self, result: Prediction, expected: Option<Prediction>) -> Self {
        self.result = Some(result);
        self.expected = expected;
        self
    }
}

/// Any event, as queued for remote listeners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum EvaluationEvent {
    Lifecycle(LifecycleEvent),
    Progress(ProgressEvent),
    Setup(SetupEvent),
}

impl EvaluationEvent {
    pub fn channel(&self) -> &'static str {
        match self {
            EvaluationEvent::Lifecycle(_) => "lifecycle",
            EvaluationEvent::Progress(_) => "progress",
            EvaluationEvent::Setup(_) => "setup",
        }
    }

    pub fn as_lifecycle(&self) -> Option<&LifecycleEvent> {
        match self {
            EvaluationEvent::Lifecycle(event) => Some(event),
            _ => None,
        }
    }
}

//! Evalrig core
//!
//! Evaluates algorithms over pools of training/testing dataset pairs and
//! aggregates the outcomes into metrics.
//!
//! # Features
//!
//! - **Metric values**: tagged values with per-shape merge rules (sums,
//!   pooled fractions, streaming means, paired samples)
//! - **Meta metrics**: second-order metrics such as RMSE and F1 computed from
//!   other metrics' aggregates
//! - **Registry**: one metric per (name, algorithm, dataset) with
//!   dependency-ordered batch recalculation
//! - **Runner**: a single worker thread with pause, resume and stop at sample
//!   boundaries, and per-unit failure isolation
//! - **Events**: push delivery to local listeners and bounded pull queues for
//!   remote observers
//!
//! # Example
//!
//! ```rust,ignore
//! use evalrig_core::{EvalConfig, EvaluationRunner};
//!
//! let runner = EvaluationRunner::new(EvalConfig::default())?;
//! runner.evaluate(algorithms, pool, serde_json::Value::Null)?;
//! runner.wait();
//! println!("{}", generate_report(&runner.result_registry(), ReportFormat::Table)?);
//! ```

pub mod algorithm;
pub mod config;
pub mod dataset;
pub mod error;
pub mod events;
pub mod metrics;
pub mod report;
pub mod runner;

// Re-exports for convenience
pub use algorithm::{Algorithm, AlgorithmConfig};
pub use config::{EvalConfig, EventsConfig, LoggingConfig};
pub use dataset::{
    Cursor, Dataset, DatasetPair, DatasetPool, MemoryCursor, MemoryDataset, Prediction, Sample,
};
pub use error::{EvalError, EvalResult};
pub use events::{
    EvaluationEvent, EventHub, LifecycleEvent, LifecycleListener, LifecycleStatus, ListenerProbe,
    ProgressEvent, ProgressListener, SetupEvent, SetupListener, SetupStatus,
};
pub use metrics::{
    Metric, MetricKind, MetricRegistry, MetricSelector, MetricSnapshot, MetricValue,
    MetricWrapper, RecalcParams, RegistrySnapshot,
};
pub use report::{generate_report, EvalReport, ReportFormat};
pub use runner::{EvaluationRunner, RunnerState};

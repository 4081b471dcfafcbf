//! The metric behaviour trait
//!
//! A metric owns two values: `current`, the result of the last successful
//! recalculation, and `accum`, the running aggregate over every recalculation
//! since the last reset. Concrete metrics only decide how their inputs map to
//! a [`MetricValue`]; the bookkeeping lives in the trait's provided methods.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::MetricValue;
use crate::dataset::Prediction;

/// Category of a metric, used for selection and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Wall-clock timings
    Time,
    /// Share of the test set that produced a result
    Coverage,
    /// Agreement between computed and expected outcomes
    Accuracy,
    /// Aggregates built from other metrics at reporting time
    Aggregate,
}

impl MetricKind {
    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            MetricKind::Time => "Time",
            MetricKind::Coverage => "Coverage",
            MetricKind::Accuracy => "Accuracy",
            MetricKind::Aggregate => "Aggregate",
        }
    }
}

/// Current and accumulated values of a metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricState {
    /// Value derived by the last successful recalculation
    pub current: Option<MetricValue>,
    /// Running aggregate since the last reset
    pub accum: Option<MetricValue>,
}

impl MetricState {
    /// Record a derived value and fold it into the aggregate
    pub fn apply(&mut self, derived: MetricValue) {
        match &mut self.accum {
            Some(accum) => {
                accum.accum(&derived);
            }
            None => self.accum = Some(derived.clone()),
        }
        self.current = Some(derived);
    }

    /// Record a derived value that already is an aggregate
    pub fn replace(&mut self, derived: MetricValue) {
        self.accum = Some(derived.clone());
        self.current = Some(derived);
    }

    /// Drop both values
    pub fn reset(&mut self) {
        self.current = None;
        self.accum = None;
    }

    /// Whether both values are present
    pub fn is_valid(&self) -> bool {
        self.current.is_some() && self.accum.is_some()
    }

    /// Whether the aggregate is present and used
    pub fn has_used_accum(&self) -> bool {
        self.accum.as_ref().is_some_and(MetricValue::is_used)
    }
}

/// Identity and state shared by every metric implementation
#[derive(Debug, Clone, PartialEq)]
pub struct MetricInfo {
    pub name: String,
    pub description: String,
    pub kind: MetricKind,
    pub state: MetricState,
}

impl MetricInfo {
    /// Create metric info with an empty state
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            state: MetricState::default(),
        }
    }
}

/// Inputs to a recalculation. Each metric accepts only some variants.
#[derive(Debug, Clone, Copy)]
pub enum RecalcParams<'a> {
    /// Elapsed wall-clock seconds
    Elapsed(f64),
    /// A computed outcome and the outcome the test set expected
    Pair {
        computed: &'a Prediction,
        expected: &'a Prediction,
    },
    /// A prebuilt value, taken as is
    Value(&'a MetricValue),
    /// Metrics recalculated earlier in the same batch
    Constituents(&'a [&'a dyn Metric]),
}

/// Stateful statistic over an evaluation run
pub trait Metric: Send + Sync + fmt::Debug {
    /// Identity and state
    fn info(&self) -> &MetricInfo;

    /// Mutable identity and state
    fn info_mut(&mut self) -> &mut MetricInfo;

    /// Map recalculation inputs to a value; `None` for inputs this metric
    /// does not understand
    fn derive(&self, params: &RecalcParams<'_>) -> Option<MetricValue>;

    /// Clone into a new box
    fn clone_box(&self) -> Box<dyn Metric>;

    /// Downcasting support for class-based selection
    fn as_any(&self) -> &dyn Any;

    /// Names of the metrics this one is derived from; empty for ordinary metrics
    fn constituents(&self) -> &[String] {
        &[]
    }

    /// Whether this metric is derived from other metrics' aggregates
    fn is_meta(&self) -> bool {
        !self.constituents().is_empty()
    }

    /// Metric name, unique per (algorithm, dataset)
    fn name(&self) -> &str {
        &self.info().name
    }

    /// Human-readable description
    fn description(&self) -> &str {
        &self.info().description
    }

    /// Metric category
    fn kind(&self) -> MetricKind {
        self.info().kind
    }

    /// Recalculate from `params`.
    ///
    /// On success the derived value becomes `current` and is folded into
    /// `accum`. Inputs the metric does not understand return `false` and leave
    /// the state untouched.
    fn recalc(&mut self, params: &RecalcParams<'_>) -> bool {
        match self.derive(params) {
            Some(derived) => {
                self.info_mut().state.apply(derived);
                true
            }
            None => false,
        }
    }

    /// Value of the last recalculation
    fn current_value(&self) -> Option<&MetricValue> {
        self.info().state.current.as_ref()
    }

    /// Running aggregate
    fn accum_value(&self) -> Option<&MetricValue> {
        self.info().state.accum.as_ref()
    }

    /// Forget every recalculation
    fn reset(&mut self) {
        self.info_mut().state.reset();
    }

    /// Whether both current and accumulated values are present
    fn is_valid(&self) -> bool {
        self.info().state.is_valid()
    }

    /// Single reportable number for the aggregate
    fn summary(&self) -> Option<f64> {
        self.accum_value().and_then(MetricValue::scalar)
    }

    /// Serializable copy of identity and state
    fn snapshot(&self) -> MetricSnapshot {
        let info = self.info();
        MetricSnapshot {
            name: info.name.clone(),
            description: info.description.clone(),
            kind: info.kind,
            current: info.state.current.clone(),
            accum: info.state.accum.clone(),
            summary: self.summary(),
        }
    }

    /// Like [`Metric::snapshot`], but a container aggregate is left out and
    /// only its summary is kept. Used for per-sample events.
    fn light_snapshot(&self) -> MetricSnapshot {
        let info = self.info();
        MetricSnapshot {
            name: info.name.clone(),
            description: info.description.clone(),
            kind: info.kind,
            current: info.state.current.clone(),
            accum: info
                .state
                .accum
                .as_ref()
                .filter(|accum| !accum.is_container())
                .cloned(),
            summary: self.summary(),
        }
    }
}

impl Clone for Box<dyn Metric> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Plain-data view of a metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub name: String,
    pub description: String,
    pub kind: MetricKind,
    pub current: Option<MetricValue>,
    pub accum: Option<MetricValue>,
    pub summary: Option<f64>,
}

impl MetricSnapshot {
    /// Whether the aggregate carries data
    pub fn is_used(&self) -> bool {
        self.accum.as_ref().is_some_and(MetricValue::is_used)
    }
}

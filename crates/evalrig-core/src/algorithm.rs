//! Algorithm collaborator

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Prediction};
use crate::error::EvalResult;

/// Per-algorithm settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    /// Free-form parameters, opaque to the evaluator
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
    /// Keep the instance set up after its unit finishes; teardown runs at the
    /// next evaluate, stop or close
    #[serde(default)]
    pub delay_teardown: bool,
}

impl AlgorithmConfig {
    pub fn with_delay_teardown(mut self, delay: bool) -> Self {
        self.delay_teardown = delay;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// Algorithm under evaluation.
///
/// The runner never reuses an instance across units: each algorithm x dataset
/// unit gets a fresh one from [`Algorithm::new_instance`], which is set up on
/// the training set, executed once per test sample and then torn down.
pub trait Algorithm: Send {
    fn name(&self) -> &str;

    fn config(&self) -> AlgorithmConfig {
        AlgorithmConfig::default()
    }

    /// Fresh, not yet set up instance with the same configuration
    fn new_instance(&self) -> Box<dyn Algorithm>;

    /// Train on `training`. `extra` is the run-wide extra parameter.
    fn setup(&mut self, training: &dyn Dataset, extra: &serde_json::Value) -> EvalResult<()>;

    /// Produce an outcome for one test input; `Ok(None)` when no result
    fn execute(&mut self, input: &serde_json::Value) -> EvalResult<Option<Prediction>>;

    /// Release whatever setup acquired
    fn unsetup(&mut self) -> EvalResult<()> {
        Ok(())
    }
}

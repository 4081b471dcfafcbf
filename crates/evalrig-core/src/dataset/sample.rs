//! Samples and predictions

use serde::{Deserialize, Serialize};

/// Outcome produced by an algorithm, or expected by a test sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prediction {
    /// Single numeric rating
    Rating(f64),
    /// Fixed-length numeric vector
    Vector(Vec<f64>),
    /// Ranked list of item ids
    Items(Vec<String>),
}

impl Prediction {
    pub fn kind(&self) -> &'static str {
        match self {
            Prediction::Rating(_) => "rating",
            Prediction::Vector(_) => "vector",
            Prediction::Items(_) => "items",
        }
    }

    pub fn as_rating(&self) -> Option<f64> {
        match self {
            Prediction::Rating(value) => Some(*value),
            _ => None,
        }
    }
}

/// One record of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Algorithm input, opaque to the evaluator
    pub input: serde_json::Value,
    /// Expected outcome, absent for training-only records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Prediction>,
}

impl Sample {
    pub fn new(input: serde_json::Value, expected: Option<Prediction>) -> Self {
        Self { input, expected }
    }

    /// Sample with an expected outcome
    pub fn labeled(input: serde_json::Value, expected: Prediction) -> Self {
        Self::new(input, Some(expected))
    }

    /// Sample without an expected outcome
    pub fn unlabeled(input: serde_json::Value) -> Self {
        Self::new(input, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prediction_serde_shape() {
        let json = serde_json::to_value(Prediction::Rating(4.5)).unwrap();
        assert_eq!(json, json!({ "rating": 4.5 }));

        let items: Prediction = serde_json::from_value(json!({ "items": ["a", "b"] })).unwrap();
        assert_eq!(items, Prediction::Items(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn test_sample_without_expected() {
        let sample: Sample = serde_json::from_value(json!({ "input": { "user": "u1" } })).unwrap();
        assert!(sample.expected.is_none());
        assert_eq!(sample.input["user"], "u1");
    }
}

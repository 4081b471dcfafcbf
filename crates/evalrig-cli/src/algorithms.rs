//! Baseline algorithms shipped with the binary
//!
//! Inputs are JSON objects; `item_mean` keys ratings by the `item` field
//! (configurable through the `key` param) and `popularity` returns the
//! `top_n` most frequent training items, skipping ids listed in the input's
//! `exclude` array.

use std::collections::HashMap;

use evalrig_core::{
    Algorithm, AlgorithmConfig, Dataset, EvalError, EvalResult, Prediction, Sample,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Names and descriptions of the baselines, in listing order
pub const BASELINES: &[(&str, &str)] = &[
    (GlobalMean::NAME, "Predicts the mean training rating"),
    (
        ItemMean::NAME,
        "Predicts the mean training rating of the input's item",
    ),
    (Popularity::NAME, "Recommends the most frequent training items"),
    (
        VectorMean::NAME,
        "Predicts the element-wise mean of the training vectors",
    ),
];

/// Algorithm selection as accepted by the control protocol: a bare name or
/// a name with its configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlgorithmSpec {
    Name(String),
    Configured {
        name: String,
        #[serde(flatten)]
        config: AlgorithmConfig,
    },
}

impl AlgorithmSpec {
    pub fn name(&self) -> &str {
        match self {
            AlgorithmSpec::Name(name) => name,
            AlgorithmSpec::Configured { name, .. } => name,
        }
    }

    pub fn build(&self) -> EvalResult<Box<dyn Algorithm>> {
        let config = match self {
            AlgorithmSpec::Name(_) => AlgorithmConfig::default(),
            AlgorithmSpec::Configured { config, .. } => config.clone(),
        };
        baseline_by_name(self.name(), config).ok_or_else(|| {
            EvalError::invalid_field("algorithms", format!("Unknown algorithm: {}", self.name()))
        })
    }
}

/// Instantiate a baseline
pub fn baseline_by_name(name: &str, config: AlgorithmConfig) -> Option<Box<dyn Algorithm>> {
    let algorithm: Box<dyn Algorithm> = match name {
        GlobalMean::NAME => Box::new(GlobalMean::new(config)),
        ItemMean::NAME => Box::new(ItemMean::new(config)),
        Popularity::NAME => Box::new(Popularity::new(config)),
        VectorMean::NAME => Box::new(VectorMean::new(config)),
        _ => return None,
    };
    Some(algorithm)
}

/// Instantiate every named baseline with default configuration
pub fn baselines_by_names<S: AsRef<str>>(names: &[S]) -> EvalResult<Vec<Box<dyn Algorithm>>> {
    names
        .iter()
        .map(|name| AlgorithmSpec::Name(name.as_ref().to_string()).build())
        .collect()
}

/// Read every sample of the training set, closing the cursor on all paths
fn training_samples(training: &dyn Dataset) -> EvalResult<Vec<Sample>> {
    let mut cursor = training.fetch()?;
    let mut samples = Vec::with_capacity(cursor.size());
    let outcome = loop {
        match cursor.next_sample() {
            Ok(Some(sample)) => samples.push(sample),
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };
    cursor.close();
    outcome.map(|_| samples)
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn str_param(config: &AlgorithmConfig, key: &str) -> Option<String> {
    config.params.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn usize_param(config: &AlgorithmConfig, key: &str) -> Option<usize> {
    config
        .params
        .get(key)
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
}

/// String form of an input field, accepting numbers as ids
fn field_key(input: &Value, field: &str) -> Option<String> {
    match input.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct GlobalMean {
    config: AlgorithmConfig,
    mean: Option<f64>,
}

impl GlobalMean {
    pub const NAME: &'static str = "global_mean";

    pub fn new(config: AlgorithmConfig) -> Self {
        Self { config, mean: None }
    }
}

impl Algorithm for GlobalMean {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn config(&self) -> AlgorithmConfig {
        self.config.clone()
    }

    fn new_instance(&self) -> Box<dyn Algorithm> {
        Box::new(Self::new(self.config.clone()))
    }

    fn setup(&mut self, training: &dyn Dataset, _extra: &Value) -> EvalResult<()> {
        let samples = training_samples(training)?;
        self.mean = mean(
            samples
                .iter()
                .filter_map(|s| s.expected.as_ref().and_then(Prediction::as_rating)),
        );
        tracing::debug!(mean = ?self.mean, "global mean trained");
        Ok(())
    }

    fn execute(&mut self, _input: &Value) -> EvalResult<Option<Prediction>> {
        Ok(self.mean.map(Prediction::Rating))
    }

    fn unsetup(&mut self) -> EvalResult<()> {
        self.mean = None;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ItemMean {
    config: AlgorithmConfig,
    key: String,
    means: HashMap<String, f64>,
    fallback: Option<f64>,
}

impl ItemMean {
    pub const NAME: &'static str = "item_mean";

    pub fn new(config: AlgorithmConfig) -> Self {
        let key = str_param(&config, "key").unwrap_or_else(|| "item".to_string());
        Self {
            config,
            key,
            means: HashMap::new(),
            fallback: None,
        }
    }
}

impl Algorithm for ItemMean {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn config(&self) -> AlgorithmConfig {
        self.config.clone()
    }

    fn new_instance(&self) -> Box<dyn Algorithm> {
        Box::new(Self::new(self.config.clone()))
    }

    fn setup(&mut self, training: &dyn Dataset, _extra: &Value) -> EvalResult<()> {
        let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
        let mut ratings = Vec::new();
        for sample in training_samples(training)? {
            let Some(rating) = sample.expected.as_ref().and_then(Prediction::as_rating) else {
                continue;
            };
            ratings.push(rating);
            if let Some(key) = field_key(&sample.input, &self.key) {
                let entry = sums.entry(key).or_insert((0.0, 0));
                entry.0 += rating;
                entry.1 += 1;
            }
        }
        self.means = sums
            .into_iter()
            .map(|(key, (sum, count))| (key, sum / count as f64))
            .collect();
        self.fallback = mean(ratings);
        tracing::debug!(items = self.means.len(), "item means trained");
        Ok(())
    }

    fn execute(&mut self, input: &Value) -> EvalResult<Option<Prediction>> {
        let rating = field_key(input, &self.key)
            .and_then(|key| self.means.get(&key).copied())
            .or(self.fallback);
        Ok(rating.map(Prediction::Rating))
    }

    fn unsetup(&mut self) -> EvalResult<()> {
        self.means.clear();
        self.fallback = None;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Popularity {
    config: AlgorithmConfig,
    top_n: usize,
    ranking: Vec<String>,
}

impl Popularity {
    pub const NAME: &'static str = "popularity";
    pub const DEFAULT_TOP_N: usize = 10;

    pub fn new(config: AlgorithmConfig) -> Self {
        let top_n = usize_param(&config, "top_n").unwrap_or(Self::DEFAULT_TOP_N);
        Self {
            config,
            top_n,
            ranking: Vec::new(),
        }
    }
}

impl Algorithm for Popularity {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn config(&self) -> AlgorithmConfig {
        self.config.clone()
    }

    fn new_instance(&self) -> Box<dyn Algorithm> {
        Box::new(Self::new(self.config.clone()))
    }

    fn setup(&mut self, training: &dyn Dataset, _extra: &Value) -> EvalResult<()> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for sample in training_samples(training)? {
            if let Some(Prediction::Items(items)) = sample.expected {
                for item in items {
                    *counts.entry(item).or_default() += 1;
                }
            }
        }
        let mut ranking: Vec<(String, usize)> = counts.into_iter().collect();
        ranking.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        self.ranking = ranking.into_iter().map(|(item, _)| item).collect();
        Ok(())
    }

    fn execute(&mut self, input: &Value) -> EvalResult<Option<Prediction>> {
        if self.ranking.is_empty() {
            return Ok(None);
        }
        let exclude: Vec<&str> = input
            .get("exclude")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        let items = self
            .ranking
            .iter()
            .filter(|item| !exclude.contains(&item.as_str()))
            .take(self.top_n)
            .cloned()
            .collect();
        Ok(Some(Prediction::Items(items)))
    }

    fn unsetup(&mut self) -> EvalResult<()> {
        self.ranking.clear();
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct VectorMean {
    config: AlgorithmConfig,
    mean: Option<Vec<f64>>,
}

impl VectorMean {
    pub const NAME: &'static str = "vector_mean";

    pub fn new(config: AlgorithmConfig) -> Self {
        Self { config, mean: None }
    }
}

impl Algorithm for VectorMean {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn config(&self) -> AlgorithmConfig {
        self.config.clone()
    }

    fn new_instance(&self) -> Box<dyn Algorithm> {
        Box::new(Self::new(self.config.clone()))
    }

    fn setup(&mut self, training: &dyn Dataset, _extra: &Value) -> EvalResult<()> {
        let mut sums: Option<Vec<f64>> = None;
        let mut count = 0usize;
        for sample in training_samples(training)? {
            let Some(Prediction::Vector(vector)) = sample.expected else {
                continue;
            };
            match sums.as_mut() {
                None => sums = Some(vector),
                Some(sums) if sums.len() == vector.len() => {
                    sums.iter_mut().zip(&vector).for_each(|(s, v)| *s += v);
                }
                Some(sums) => {
                    return Err(EvalError::algorithm(
                        Self::NAME,
                        format!(
                            "training vectors differ in length: {} vs {}",
                            sums.len(),
                            vector.len()
                        ),
                    ));
                }
            }
            count += 1;
        }
        self.mean = sums.map(|sums| sums.into_iter().map(|s| s / count as f64).collect());
        Ok(())
    }

    fn execute(&mut self, _input: &Value) -> EvalResult<Option<Prediction>> {
        Ok(self.mean.clone().map(Prediction::Vector))
    }

    fn unsetup(&mut self) -> EvalResult<()> {
        self.mean = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evalrig_core::MemoryDataset;
    use serde_json::json;

    fn trained(name: &str, config: AlgorithmConfig, samples: Vec<Sample>) -> Box<dyn Algorithm> {
        let mut algorithm = baseline_by_name(name, config).unwrap();
        algorithm
            .setup(&MemoryDataset::new(1, samples), &Value::Null)
            .unwrap();
        algorithm
    }

    fn rating(item: &str, value: f64) -> Sample {
        Sample::labeled(json!({ "item": item }), Prediction::Rating(value))
    }

    #[test]
    fn test_global_mean() {
        let mut algorithm = trained(
            GlobalMean::NAME,
            AlgorithmConfig::default(),
            vec![rating("a", 2.0), rating("b", 4.0), Sample::unlabeled(json!({}))],
        );
        assert_eq!(
            algorithm.execute(&json!({})).unwrap(),
            Some(Prediction::Rating(3.0))
        );

        algorithm.unsetup().unwrap();
        assert_eq!(algorithm.execute(&json!({})).unwrap(), None);
    }

    #[test]
    fn test_global_mean_without_ratings() {
        let mut algorithm = trained(GlobalMean::NAME, AlgorithmConfig::default(), vec![]);
        assert_eq!(algorithm.execute(&json!({})).unwrap(), None);
    }

    #[test]
    fn test_item_mean_falls_back_to_global() {
        let mut algorithm = trained(
            ItemMean::NAME,
            AlgorithmConfig::default(),
            vec![rating("a", 1.0), rating("a", 3.0), rating("b", 5.0)],
        );
        assert_eq!(
            algorithm.execute(&json!({ "item": "a" })).unwrap(),
            Some(Prediction::Rating(2.0))
        );
        assert_eq!(
            algorithm.execute(&json!({ "item": "zzz" })).unwrap(),
            Some(Prediction::Rating(3.0))
        );
    }

    #[test]
    fn test_item_mean_custom_key() {
        let config = AlgorithmConfig::default().with_param("key", json!("movie"));
        let mut algorithm = trained(
            ItemMean::NAME,
            config,
            vec![
                Sample::labeled(json!({ "movie": 7 }), Prediction::Rating(4.0)),
                Sample::labeled(json!({ "movie": 8 }), Prediction::Rating(2.0)),
            ],
        );
        assert_eq!(
            algorithm.execute(&json!({ "movie": 7 })).unwrap(),
            Some(Prediction::Rating(4.0))
        );
    }

    #[test]
    fn test_popularity_ranking() {
        let items = |ids: &[&str]| {
            Sample::labeled(
                json!({}),
                Prediction::Items(ids.iter().map(|s| s.to_string()).collect()),
            )
        };
        let config = AlgorithmConfig::default().with_param("top_n", json!(2));
        let mut algorithm = trained(
            Popularity::NAME,
            config,
            vec![items(&["x", "y"]), items(&["y", "z"]), items(&["y", "x"])],
        );

        assert_eq!(
            algorithm.execute(&json!({})).unwrap(),
            Some(Prediction::Items(vec!["y".into(), "x".into()]))
        );
        assert_eq!(
            algorithm.execute(&json!({ "exclude": ["y"] })).unwrap(),
            Some(Prediction::Items(vec!["x".into(), "z".into()]))
        );
    }

    #[test]
    fn test_vector_mean() {
        let mut algorithm = trained(
            VectorMean::NAME,
            AlgorithmConfig::default(),
            vec![
                Sample::labeled(json!({}), Prediction::Vector(vec![1.0, 2.0])),
                Sample::labeled(json!({}), Prediction::Vector(vec![3.0, 6.0])),
            ],
        );
        assert_eq!(
            algorithm.execute(&json!({})).unwrap(),
            Some(Prediction::Vector(vec![2.0, 4.0]))
        );
    }

    #[test]
    fn test_vector_mean_rejects_ragged_training() {
        let mut algorithm = VectorMean::new(AlgorithmConfig::default());
        let dataset = MemoryDataset::new(
            1,
            vec![
                Sample::labeled(json!({}), Prediction::Vector(vec![1.0, 2.0])),
                Sample::labeled(json!({}), Prediction::Vector(vec![1.0])),
            ],
        );
        let err = algorithm.setup(&dataset, &Value::Null).unwrap_err();
        assert!(matches!(err, EvalError::Algorithm { .. }));
    }

    #[test]
    fn test_spec_deserialization() {
        let specs: Vec<AlgorithmSpec> = serde_json::from_value(json!([
            "global_mean",
            { "name": "popularity", "params": { "top_n": 3 }, "delay_teardown": true }
        ]))
        .unwrap();
        assert_eq!(specs[0].name(), "global_mean");
        match &specs[1] {
            AlgorithmSpec::Configured { name, config } => {
                assert_eq!(name, "popularity");
                assert!(config.delay_teardown);
                assert_eq!(config.params["top_n"], json!(3));
            }
            other => panic!("unexpected selection: {:?}", other),
        }
        assert!(specs[1].build().unwrap().config().delay_teardown);
    }

    #[test]
    fn test_unknown_baseline() {
        let Err(err) = baselines_by_names(&["global_mean", "oracle"]) else {
            panic!("unknown baseline accepted");
        };
        assert!(matches!(err, EvalError::InvalidInput { .. }));
        assert_eq!(baselines_by_names(&["global_mean"]).unwrap().len(), 1);
    }
}

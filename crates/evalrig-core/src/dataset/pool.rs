//! Training/testing pairs

use std::sync::Arc;

use super::Dataset;
use crate::error::{EvalError, EvalResult};

/// A training set and the test set it is evaluated on
#[derive(Debug, Clone)]
pub struct DatasetPair {
    pub id: u32,
    pub training: Arc<dyn Dataset>,
    pub testing: Arc<dyn Dataset>,
}

impl DatasetPair {
    pub fn new(id: u32, training: Arc<dyn Dataset>, testing: Arc<dyn Dataset>) -> Self {
        Self {
            id,
            training,
            testing,
        }
    }

    /// Locator reported for the pair; the testing side wins
    pub fn locator(&self) -> Option<String> {
        self.testing.locator().or_else(|| self.training.locator())
    }
}

/// Ordered pairs, unique by id
#[derive(Debug, Clone, Default)]
pub struct DatasetPool {
    pairs: Vec<DatasetPair>,
}

impl DatasetPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair; a duplicate id is rejected
    pub fn add(&mut self, pair: DatasetPair) -> EvalResult<()> {
        if self.get(pair.id).is_some() {
            return Err(EvalError::invalid_field(
                "id",
                format!("Dataset pair {} already in pool", pair.id),
            ));
        }
        self.pairs.push(pair);
        Ok(())
    }

    pub fn get(&self, id: u32) -> Option<&DatasetPair> {
        self.pairs.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetPair> {
        self.pairs.iter()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.pairs.iter().map(|p| p.id).collect()
    }
}

//! Dataset pool files
//!
//! ```json
//! {
//!   "pairs": [
//!     {
//!       "id": 1,
//!       "locator": "ml-100k/fold1",
//!       "training": [{ "input": { "item": "a" }, "expected": { "rating": 4.0 } }],
//!       "testing": [{ "input": { "item": "a" }, "expected": { "rating": 5.0 } }]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use evalrig_core::{DatasetPair, DatasetPool, MemoryDataset, Sample};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PoolFile {
    pairs: Vec<PairEntry>,
}

#[derive(Debug, Deserialize)]
struct PairEntry {
    id: u32,
    #[serde(default)]
    locator: Option<String>,
    #[serde(default)]
    training: Vec<Sample>,
    testing: Vec<Sample>,
}

impl PairEntry {
    fn into_pair(self) -> DatasetPair {
        let dataset = |samples: Vec<Sample>| {
            let dataset = MemoryDataset::new(self.id, samples);
            match &self.locator {
                Some(locator) => dataset.with_locator(locator.clone()),
                None => dataset,
            }
        };
        let training = dataset(self.training);
        let testing = dataset(self.testing);
        DatasetPair::new(self.id, Arc::new(training), Arc::new(testing))
    }
}

/// Parse a pool from its JSON text
pub fn parse_pool(content: &str) -> Result<DatasetPool> {
    let file: PoolFile = serde_json::from_str(content).context("Invalid pool file")?;
    let mut pool = DatasetPool::new();
    for entry in file.pairs {
        pool.add(entry.into_pair())?;
    }
    Ok(pool)
}

/// Load a pool file from disk
pub fn load_pool(path: &Path) -> Result<DatasetPool> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pool file: {}", path.display()))?;
    let pool = parse_pool(&content).with_context(|| format!("In {}", path.display()))?;
    tracing::debug!(path = %path.display(), pairs = pool.len(), "pool loaded");
    Ok(pool)
}

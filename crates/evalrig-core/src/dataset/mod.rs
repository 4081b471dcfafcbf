//! Dataset collaborators
//!
//! The runner consumes datasets through two small traits: [`Dataset`] hands
//! out single-pass [`Cursor`]s over its samples. Training/testing pairs are
//! grouped into an ordered [`DatasetPool`].

mod memory;
mod pool;
mod sample;

pub use memory::{MemoryCursor, MemoryDataset};
pub use pool::{DatasetPair, DatasetPool};
pub use sample::{Prediction, Sample};

use std::fmt;

use crate::error::EvalResult;

/// Source of samples
pub trait Dataset: Send + Sync + fmt::Debug {
    /// Identifier, shared by the training and testing side of a pair
    fn id(&self) -> u32;

    /// Where the data came from, for reporting
    fn locator(&self) -> Option<String> {
        None
    }

    /// Open a fresh cursor positioned before the first sample
    fn fetch(&self) -> EvalResult<Box<dyn Cursor>>;
}

/// Finite, single-pass iterator over samples
pub trait Cursor: Send {
    /// Number of samples the cursor yields in total
    fn size(&self) -> usize;

    /// Next sample, `None` once exhausted
    fn next_sample(&mut self) -> EvalResult<Option<Sample>>;

    /// Release underlying resources. Called exactly once by the runner.
    fn close(&mut self) {}
}

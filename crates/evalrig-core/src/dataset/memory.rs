//! In-memory datasets

use std::sync::Arc;

use super::{Cursor, Dataset, Sample};
use crate::error::EvalResult;

/// Dataset backed by a shared vector of samples
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    id: u32,
    locator: Option<String>,
    samples: Arc<Vec<Sample>>,
}

impl MemoryDataset {
    pub fn new(id: u32, samples: Vec<Sample>) -> Self {
        Self {
            id,
            locator: None,
            samples: Arc::new(samples),
        }
    }

    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

impl Dataset for MemoryDataset {
    fn id(&self) -> u32 {
        self.id
    }

    fn locator(&self) -> Option<String> {
        self.locator.clone()
    }

    fn fetch(&self) -> EvalResult<Box<dyn Cursor>> {
        Ok(Box::new(MemoryCursor::new(Arc::clone(&self.samples))))
    }
}

/// Cursor over a [`MemoryDataset`]
#[derive(Debug)]
pub struct MemoryCursor {
    samples: Arc<Vec<Sample>>,
    position: usize,
    closed: bool,
}

impl MemoryCursor {
    pub fn new(samples: Arc<Vec<Sample>>) -> Self {
        Self {
            samples,
            position: 0,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Cursor for MemoryCursor {
    fn size(&self) -> usize {
        self.samples.len()
    }

    fn next_sample(&mut self) -> EvalResult<Option<Sample>> {
        if self.closed {
            return Ok(None);
        }
        let sample = self.samples.get(self.position).cloned();
        if sample.is_some() {
            self.position += 1;
        }
        Ok(sample)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

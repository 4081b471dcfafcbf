//! Error types for Evalrig
//!
//! A single error enum is shared by every layer of the evaluator. Failures that
//! belong to one algorithm x dataset unit are recoverable: the runner logs them
//! and moves on. Control-surface misuse (starting twice, draining an unknown
//! listener) is reported to the caller as a value.

mod constructors;
mod conversions;
mod types;

pub use types::{EvalError, EvalResult};

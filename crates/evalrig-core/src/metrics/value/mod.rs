//! Metric values and their merge rules
//!
//! A [`MetricValue`] is both the value reported by a metric and the accumulator
//! that aggregates it over many recalculations. Each shape has its own merge
//! rule (see [`MetricValue::accum`]). Merging two different shapes, or merging
//! an unused operand, is a silent no-op.

mod accum;
mod display;


use serde::{Deserialize, Serialize};

/// Tagged metric value / accumulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricValue {
    /// Plain scalar; merging adds
    Real { value: f64 },

    /// Ratio kept as numerator and denominator; merging sums both parts,
    /// which yields a weighted average rather than a mean of ratios
    Fraction { numerator: f64, denominator: f64 },

    /// Streaming mean of `count` observations
    Mean { value: f64, count: u64 },

    /// Element-wise streaming mean of equally long lists
    ArrayMean { values: Vec<f64>, count: u64 },

    /// Growing list of values; merging appends
    Array { items: Vec<MetricValue> },

    /// Paired samples; merging appends pairs where both sides are used
    TwoArray {
        left: Vec<MetricValue>,
        right: Vec<MetricValue>,
    },

    /// Fixed-position values; merging is element-wise
    Vector { items: Vec<MetricValue> },
}

impl MetricValue {
    /// Create a scalar value
    pub fn real(value: f64) -> Self {
        Self::Real { value }
    }

    /// Create a fraction value
    pub fn fraction(numerator: f64, denominator: f64) -> Self {
        Self::Fraction {
            numerator,
            denominator,
        }
    }

    /// Create a mean initialized with a single observation
    pub fn mean(value: f64) -> Self {
        Self::Mean { value, count: 1 }
    }

    /// Create an element-wise mean initialized with a single observation
    pub fn array_mean(values: Vec<f64>) -> Self {
        Self::ArrayMean { values, count: 1 }
    }

    /// Create an array value
    pub fn array(items: Vec<MetricValue>) -> Self {
        Self::Array { items }
    }

    /// Create a paired value.
    ///
    /// Lists are truncated to the shorter length and pairs with an unused side
    /// are dropped, the same filter [`MetricValue::accum`] applies.
    pub fn two_array(left: Vec<MetricValue>, right: Vec<MetricValue>) -> Self {
        let (left, right) = left
            .into_iter()
            .zip(right)
            .filter(|(l, r)| l.is_used() && r.is_used())
            .unzip();
        Self::TwoArray { left, right }
    }

    /// Create a vector value
    pub fn vector(items: Vec<MetricValue>) -> Self {
        Self::Vector { items }
    }

    /// Short name of the shape, used in logs and reports
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Real { .. } => "real",
            Self::Fraction { .. } => "fraction",
            Self::Mean { .. } => "mean",
            Self::ArrayMean { .. } => "array_mean",
            Self::Array { .. } => "array",
            Self::TwoArray { .. } => "two_array",
            Self::Vector { .. } => "vector",
        }
    }

    /// Whether the value is a collection of other values. Such aggregates
    /// grow with every sample merged into them.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Array { .. } | Self::TwoArray { .. } | Self::Vector { .. }
        )
    }

    /// Whether the backing data is present and numerically valid
    pub fn is_used(&self) -> bool {
        match self {
            Self::Real { value } => value.is_finite(),
            Self::Fraction {
                numerator,
                denominator,
            } => *denominator != 0.0 && (numerator / denominator).is_finite(),
            Self::Mean { value, count } => *count > 0 && value.is_finite(),
            Self::ArrayMean { values, count } => *count > 0 && !values.is_empty(),
            Self::Array { items } | Self::Vector { items } => !items.is_empty(),
            Self::TwoArray { left, .. } => !left.is_empty(),
        }
    }

    /// Single numeric reading of a scalar-shaped value.
    ///
    /// Returns `None` for unused values and for container shapes.
    pub fn scalar(&self) -> Option<f64> {
        if !self.is_used() {
            return None;
        }
        match self {
            Self::Real { value } | Self::Mean { value, .. } => Some(*value),
            Self::Fraction {
                numerator,
                denominator,
            } => Some(numerator / denominator),
            _ => None,
        }
    }

    /// Numeric readings of a list-shaped value.
    ///
    /// Every element must have a scalar reading, otherwise `None` is returned
    /// so that positions are never silently shifted.
    pub fn scalars(&self) -> Option<Vec<f64>> {
        if !self.is_used() {
            return None;
        }
        match self {
            Self::ArrayMean { values, .. } => Some(values.clone()),
            Self::Array { items } | Self::Vector { items } => {
                items.iter().map(MetricValue::scalar).collect()
            }
            _ => None,
        }
    }

    /// Wrap the numeric payload in a fresh streaming mean.
    ///
    /// Scalar shapes become a [`MetricValue::Mean`], list shapes an
    /// [`MetricValue::ArrayMean`]. This is how derived metrics consume other
    /// metrics' aggregates without revisiting raw samples.
    pub fn mean_wrapper(&self) -> Option<MetricValue> {
        if let Some(value) = self.scalar() {
            return Some(MetricValue::mean(value));
        }
        self.scalars().map(MetricValue::array_mean)
    }

    /// Number of observations folded into this value, where meaningful
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Mean { count, .. } | Self::ArrayMean { count, .. } => Some(*count),
            Self::Array { items } | Self::Vector { items } => Some(items.len() as u64),
            Self::TwoArray { left, .. } => Some(left.len() as u64),
            _ => None,
        }
    }
}

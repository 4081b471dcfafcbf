//! Human-readable rendering of metric values

use std::fmt;

use super::MetricValue;

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_used() {
            return write!(f, "-");
        }
        match self {
            Self::Real { value } => write!(f, "{:.4}", value),
            Self::Fraction {
                numerator,
                denominator,
            } => write!(
                f,
                "{:.4} ({}/{})",
                numerator / denominator,
                numerator,
                denominator
            ),
            Self::Mean { value, count } => write!(f, "{:.4} (n={})", value, count),
            Self::ArrayMean { values, count } => {
                write!(f, "[{}] (n={})", join(values.iter().map(|v| format!("{:.4}", v))), count)
            }
            Self::Array { items } => write!(f, "[{} items]", items.len()),
            Self::TwoArray { left, .. } => write!(f, "[{} pairs]", left.len()),
            Self::Vector { items } => {
                write!(f, "<{}>", join(items.iter().map(|item| item.to_string())))
            }
        }
    }
}

fn join(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join(", ")
}

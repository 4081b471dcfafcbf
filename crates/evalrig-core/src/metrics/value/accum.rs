//! Merge rules for metric values

use super::MetricValue;

impl MetricValue {
    /// Merge `other` into `self` following the rule of `self`'s shape.
    ///
    /// Returns `true` when `self` changed. An unused operand or an operand of
    /// a different shape leaves `self` untouched; validating shapes is the
    /// caller's job.
    pub fn accum(&mut self, other: &MetricValue) -> bool {
        if !other.is_used() {
            return false;
        }

        let self_used = self.is_used();
        match (self, other) {
            (Self::Real { value }, Self::Real { value: rhs }) => {
                if self_used {
                    *value += rhs;
                } else {
                    *value = *rhs;
                }
                true
            }

            (
                Self::Fraction {
                    numerator,
                    denominator,
                },
                Self::Fraction {
                    numerator: rhs_num,
                    denominator: rhs_den,
                },
            ) => {
                if self_used {
                    *numerator += rhs_num;
                    *denominator += rhs_den;
                } else {
                    *numerator = *rhs_num;
                    *denominator = *rhs_den;
                }
                true
            }

            (Self::Mean { value, count }, Self::Mean { value: rhs, .. }) => {
                if self_used {
                    let n = *count as f64;
                    *value = *value * n / (n + 1.0) + rhs / (n + 1.0);
                    *count += 1;
                } else {
                    *value = *rhs;
                    *count = 1;
                }
                true
            }

            (Self::ArrayMean { values, count }, Self::ArrayMean { values: rhs, .. }) => {
                if self_used {
                    // Mismatched lengths keep only the common prefix
                    let len = values.len().min(rhs.len());
                    values.truncate(len);
                    let n = *count as f64;
                    for (value, rhs) in values.iter_mut().zip(rhs) {
                        *value = *value * n / (n + 1.0) + rhs / (n + 1.0);
                    }
                    *count += 1;
                } else {
                    *values = rhs.clone();
                    *count = 1;
                }
                true
            }

            (Self::Array { items }, Self::Array { items: rhs }) => {
                items.extend(rhs.iter().cloned());
                true
            }

            (
                Self::TwoArray { left, right },
                Self::TwoArray {
                    left: rhs_left,
                    right: rhs_right,
                },
            ) => {
                let mut changed = false;
                for (l, r) in rhs_left.iter().zip(rhs_right) {
                    if l.is_used() && r.is_used() {
                        left.push(l.clone());
                        right.push(r.clone());
                        changed = true;
                    }
                }
                changed
            }

            (Self::Vector { items }, Self::Vector { items: rhs }) => {
                let common = items.len().min(rhs.len());
                for (item, rhs) in items.iter_mut().zip(&rhs[..common]) {
                    item.accum(rhs);
                }
                items.extend(rhs[common..].iter().cloned());
                true
            }

            _ => false,
        }
    }

    /// Return a merged copy, leaving both operands untouched
    pub fn merged(&self, other: &MetricValue) -> MetricValue {
        let mut merged = self.clone();
        merged.accum(other);
        merged
    }
}

//! Emptiness checks used to decide whether a stage runs or a section renders.

use crate::models::{MetricRecord, MetricValue, Scalar};

/// Whether a value is absent or empty.
///
/// Absent values, empty sequences and empty records are empty. So are the
/// "falsy" scalars: numeric zero, NaN and empty text. A scalar `0` counts as
/// empty, so this check is not a general-purpose presence test for leaves.
pub fn is_empty(value: Option<&MetricValue>) -> bool {
    match value {
        None => true,
        Some(MetricValue::Record(record)) => record.is_empty(),
        Some(MetricValue::Sequence(items)) => items.is_empty(),
        Some(MetricValue::Scalar(Scalar::Number(n))) => *n == 0.0 || n.is_nan(),
        Some(MetricValue::Scalar(Scalar::Text(s))) => s.is_empty(),
    }
}

/// Record form of [`is_empty`].
pub fn record_is_empty(record: &MetricRecord) -> bool {
    record.is_empty()
}

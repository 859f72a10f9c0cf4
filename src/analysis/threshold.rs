//! Threshold filtering of metric trees.
//!
//! Scalar leaves whose numeric value falls below a threshold are pruned.
//! Nested records and sequences are always descended into and are never
//! removed themselves, even when every child is pruned.

use crate::models::{MetricRecord, MetricValue, Threshold};

/// Remove every scalar leaf below `threshold` from the record, in place.
///
/// Mutates and returns its argument. Callers holding a canonical record
/// must `clone()` it first and filter the copy.
///
/// Non-numeric scalars are kept. [`Threshold::NONE`] leaves the record untouched.
///
/// Pruned sequence elements are removed outright, so later elements shift
/// down and positions are not stable across thresholds.
pub fn filter_by_threshold(record: &mut MetricRecord, threshold: Threshold) -> &mut MetricRecord {
    if threshold.is_none() {
        return record;
    }

    for value in record.values_mut() {
        filter_value(value, threshold);
    }
    record.retain(|_, value| !is_below(value, threshold));

    record
}

/// Filter any metric value in place. A scalar on its own is left as is.
pub fn filter_value(value: &mut MetricValue, threshold: Threshold) {
    match value {
        MetricValue::Scalar(_) => {}
        MetricValue::Record(record) => {
            filter_by_threshold(record, threshold);
        }
        MetricValue::Sequence(items) => {
            if threshold.is_none() {
                return;
            }
            for item in items.iter_mut() {
                filter_value(item, threshold);
            }
            items.retain(|item| !is_below(item, threshold));
        }
    }
}

/// Whether `value` is a numeric scalar strictly below the threshold.
fn is_below(value: &MetricValue, threshold: Threshold) -> bool {
    match value {
        MetricValue::Scalar(scalar) => scalar.as_number().is_some_and(|n| n < threshold.value()),
        _ => false,
    }
}

/// Collect the distinct numeric leaf values of a record, ascending.
///
/// These are the values offered as selectable thresholds.
pub fn collect_scalar_leaves(record: &MetricRecord) -> Vec<f64> {
    let mut leaves = Vec::new();
    for value in record.values() {
        collect_into(value, &mut leaves);
    }

    leaves.sort_by(|a, b| a.total_cmp(b));
    leaves.dedup();
    leaves
}

fn collect_into(value: &MetricValue, leaves: &mut Vec<f64>) {
    match value {
        MetricValue::Scalar(scalar) => {
            if let Some(n) = scalar.as_number() {
                leaves.push(n);
            }
        }
        MetricValue::Record(record) => record.values().for_each(|v| collect_into(v, leaves)),
        MetricValue::Sequence(items) => items.iter().for_each(|v| collect_into(v, leaves)),
    }
}

//! Field-by-field averaging of metric records.
//!
//! Several structurally similar records (one per queried origin) are merged
//! into a single record of per-field averages, recursing through nested
//! records and parallel sequence positions.

use crate::models::{MetricRecord, MetricValue, Scalar};
use bigdecimal::{BigDecimal, RoundingMode};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Number of decimal places kept in every averaged scalar.
const AVERAGE_SCALE: i64 = 2;

/// Average a set of metric records field by field.
///
/// The output holds the union of all field names. Each field is averaged
/// over the records that define it only. Scalars are averaged to a
/// 2-decimal string, even when a single record defines the field.
/// A field whose defining values mix kinds is dropped.
///
/// Sequences are merged positionally and the output takes the length of the
/// first defining sequence. Inputs are expected to agree on sequence
/// lengths; a shorter sequence does not contribute at the positions it
/// lacks.
pub fn average(records: &[MetricRecord]) -> MetricRecord {
    let refs: Vec<&MetricRecord> = records.iter().collect();
    average_refs(&refs)
}

fn average_refs(records: &[&MetricRecord]) -> MetricRecord {
    let keys: BTreeSet<&String> = records.iter().flat_map(|r| r.keys()).collect();

    let mut averaged = MetricRecord::new();
    for key in keys {
        let values: Vec<&MetricValue> = records.iter().filter_map(|r| r.get(key)).collect();

        match average_values(&values) {
            Some(value) => {
                averaged.insert(key.clone(), value);
            }
            None => debug!("Dropping field '{}': values of mixed kinds", key),
        }
    }

    averaged
}

/// Average values that share a position in their parent structure.
///
/// Returns `None` when the values are empty or do not share a kind.
pub fn average_values(values: &[&MetricValue]) -> Option<MetricValue> {
    if values.is_empty() {
        return None;
    }

    if let Some(records) = all_of(values, MetricValue::as_record) {
        return Some(MetricValue::Record(average_refs(&records)));
    }

    if let Some(sequences) = all_of(values, MetricValue::as_sequence) {
        return Some(MetricValue::Sequence(average_sequences(&sequences)));
    }

    if let Some(scalars) = all_of(values, MetricValue::as_scalar) {
        return mean_of(&scalars).map(MetricValue::Scalar);
    }

    None
}

/// Merge sequences position by position.
fn average_sequences(sequences: &[&[MetricValue]]) -> Vec<MetricValue> {
    let length = sequences[0].len();
    if sequences.iter().any(|s| s.len() != length) {
        warn!(
            "Sequence lengths differ across records ({:?}); averaging over the first {} positions",
            sequences.iter().map(|s| s.len()).collect::<Vec<_>>(),
            length
        );
    }

    (0..length)
        .map(|index| {
            let column: Vec<&MetricValue> =
                sequences.iter().filter_map(|s| s.get(index)).collect();
            // Keep the slot so later positions stay aligned.
            average_values(&column).unwrap_or_else(|| MetricValue::Record(MetricRecord::new()))
        })
        .collect()
}

/// Arithmetic mean rounded half-up to two decimals, or `None` if any value is not numeric.
fn mean_of(scalars: &[&Scalar]) -> Option<Scalar> {
    let decimals = scalars
        .iter()
        .map(|s| s.as_decimal())
        .collect::<Option<Vec<BigDecimal>>>()?;

    let count = BigDecimal::from(decimals.len() as u64);
    let total = decimals
        .into_iter()
        .fold(BigDecimal::from(0), |total, value| total + value);
    let mean = (total / count).with_scale_round(AVERAGE_SCALE, RoundingMode::HalfUp);

    Some(Scalar::Text(format_fixed(&mean)))
}

/// Render a decimal already scaled to `AVERAGE_SCALE` with every trailing digit.
///
/// `BigDecimal`'s `Display` prints a scaled zero as `0`, so the string is
/// built from the unscaled digits instead.
fn format_fixed(value: &BigDecimal) -> String {
    let (digits, _) = value.as_bigint_and_exponent();
    let text = digits.to_string();
    let (sign, magnitude) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };

    let scale = AVERAGE_SCALE as usize;
    let padded = format!("{:0>width$}", magnitude, width = scale + 1);
    let (whole, fraction) = padded.split_at(padded.len() - scale);
    format!("{}{}.{}", sign, whole, fraction)
}

/// Project every value through `f`, or `None` if any value does not match.
fn all_of<'a, T: ?Sized>(
    values: &[&'a MetricValue],
    f: impl Fn(&'a MetricValue) -> Option<&'a T>,
) -> Option<Vec<&'a T>> {
    values.iter().map(|&v| f(v)).collect()
}

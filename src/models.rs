//! Data models for the performance reporter.
//!
//! This module contains the nested metric tree shared by every stage of
//! the pipeline, plus the small value types that steer filtering.

use crate::source::Platform;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// A nested mapping from field name to metric value.
///
/// Backed by a `BTreeMap` so every traversal visits keys in ascending order.
pub type MetricRecord = BTreeMap<String, MetricValue>;

/// A leaf value in a metric tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// A plain JSON number.
    Number(f64),
    /// A string, usually holding a number (e.g. `"0.05"` or `"15.00"`).
    Text(String),
}

impl Scalar {
    /// Parses the scalar as a number.
    ///
    /// Text is trimmed and parsed strictly; anything that is not a plain
    /// float literal yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Scalar::Number(n) => *n,
            Scalar::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (!value.is_nan()).then_some(value)
    }

    /// Returns the scalar as an exact decimal, for averaging.
    pub fn as_decimal(&self) -> Option<BigDecimal> {
        match self {
            // Shortest round-trip form, so 0.1 stays 0.1 rather than its binary expansion.
            Scalar::Number(n) if n.is_finite() => BigDecimal::from_str(&n.to_string()).ok(),
            Scalar::Number(_) => None,
            Scalar::Text(s) => BigDecimal::from_str(s.trim()).ok(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

/// A node in a metric tree: a scalar leaf, an ordered sequence, or a nested record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(Scalar),
    Sequence(Vec<MetricValue>),
    Record(MetricRecord),
}

impl MetricValue {
    /// Returns the nested record, if this value is one.
    pub fn as_record(&self) -> Option<&MetricRecord> {
        match self {
            MetricValue::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Returns the sequence elements, if this value is a sequence.
    pub fn as_sequence(&self) -> Option<&[MetricValue]> {
        match self {
            MetricValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the scalar leaf, if this value is one.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            MetricValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

impl From<f64> for MetricValue {
    fn from(n: f64) -> Self {
        MetricValue::Scalar(Scalar::Number(n))
    }
}

impl From<&str> for MetricValue {
    fn from(s: &str) -> Self {
        MetricValue::Scalar(Scalar::from(s))
    }
}

impl From<MetricRecord> for MetricValue {
    fn from(record: MetricRecord) -> Self {
        MetricValue::Record(record)
    }
}

impl From<Vec<MetricValue>> for MetricValue {
    fn from(items: Vec<MetricValue>) -> Self {
        MetricValue::Sequence(items)
    }
}

/// Numeric cutoff: scalar leaves strictly below it are pruned.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Threshold(f64);

impl Threshold {
    /// The "no filtering" sentinel.
    pub const NONE: Threshold = Threshold(0.0);

    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whether this threshold prunes nothing.
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

impl FromStr for Threshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| format!("Invalid threshold: {}", s))?;
        if !value.is_finite() {
            return Err(format!("Threshold must be a finite number: {}", s));
        }
        Ok(Self::new(value))
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The set of top-level fields currently shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSelection(BTreeSet<String>);

impl FilterSelection {
    /// Selects every top-level field of the record.
    pub fn all_of(record: &MetricRecord) -> Self {
        Self(record.keys().cloned().collect())
    }

    /// Selects the given fields.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }

    /// Adds the field if absent, removes it otherwise. Returns whether it is now selected.
    pub fn toggle(&mut self, field: &str) -> bool {
        if self.0.remove(field) {
            false
        } else {
            self.0.insert(field.to_string());
            true
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Origins or file paths the records came from.
    pub sources: Vec<String>,
    /// Device class queried. Unset when the records were read from files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Whether the metrics are an average over several sources.
    pub averaged: bool,
}

/// The complete performance report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Metadata about the report.
    pub metadata: ReportMetadata,
    /// Every top-level field of the unfiltered record.
    pub fields: Vec<String>,
    /// Fields currently shown.
    pub selected_fields: FilterSelection,
    /// Threshold applied to the shown metrics.
    pub threshold: Threshold,
    /// Distinct numeric values that can be chosen as a threshold.
    pub available_thresholds: Vec<f64>,
    /// The filtered metrics.
    pub metrics: MetricRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_as_number() {
        assert_eq!(Scalar::Number(2.5).as_number(), Some(2.5));
        assert_eq!(Scalar::from(" 0.05 ").as_number(), Some(0.05));
        assert_eq!(Scalar::from("fast").as_number(), None);
        assert_eq!(Scalar::from("").as_number(), None);
    }

    #[test]
    fn test_scalar_as_decimal() {
        assert_eq!(
            Scalar::Number(0.1).as_decimal(),
            Some(BigDecimal::from_str("0.1").unwrap())
        );
        assert_eq!(
            Scalar::from("12.50").as_decimal(),
            Some(BigDecimal::from_str("12.5").unwrap())
        );
        assert_eq!(Scalar::from("n/a").as_decimal(), None);
    }

    #[test]
    fn test_deserialize_nested_record() {
        let json = r#"{
            "cumulative_layout_shift": {
                "histogram": [{"start": "0.00", "end": "0.10", "density": 0.8}],
                "percentiles": {"p75": "0.05"}
            },
            "first_input_delay": {"percentiles": {"p75": 12}}
        }"#;

        let record: MetricRecord = serde_json::from_str(json).unwrap();
        let cls = record["cumulative_layout_shift"].as_record().unwrap();
        let histogram = cls["histogram"].as_sequence().unwrap();
        assert_eq!(histogram.len(), 1);
        assert_eq!(
            histogram[0].as_record().unwrap()["density"],
            MetricValue::from(0.8)
        );
        let fid = record["first_input_delay"].as_record().unwrap();
        assert_eq!(
            fid["percentiles"].as_record().unwrap()["p75"],
            MetricValue::from(12.0)
        );
    }

    #[test]
    fn test_deserialize_rejects_null() {
        let result = serde_json::from_str::<MetricRecord>(r#"{"a": null}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_threshold_parsing() {
        assert_eq!("10".parse::<Threshold>().unwrap(), Threshold::new(10.0));
        assert!("0".parse::<Threshold>().unwrap().is_none());
        assert_eq!(Threshold::default(), Threshold::NONE);
        assert!("abc".parse::<Threshold>().is_err());
        assert!("inf".parse::<Threshold>().is_err());
    }

    #[test]
    fn test_filter_selection_toggle() {
        let mut record = MetricRecord::new();
        record.insert("a".to_string(), MetricValue::from(1.0));
        record.insert("b".to_string(), MetricValue::from(2.0));

        let mut selection = FilterSelection::all_of(&record);
        assert_eq!(selection.len(), 2);

        assert!(!selection.toggle("a"));
        assert!(!selection.contains("a"));
        assert!(selection.toggle("a"));
        assert!(selection.contains("a"));
    }
}

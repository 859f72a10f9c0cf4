//! The filtered view shown to the user.
//!
//! A view is always rebuilt from the canonical record: the record is cloned,
//! narrowed to the selected top-level fields, then threshold-filtered.

use crate::analysis::threshold::filter_by_threshold;
use crate::models::{FilterSelection, MetricRecord, Threshold};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

static LABEL_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^_*(.)|_+(.)").expect("label pattern is valid"));

/// Build the displayed record from the canonical one.
///
/// The canonical record is never modified, and filters never stack: every
/// call starts again from a fresh copy.
pub fn build_view(
    full: &MetricRecord,
    selection: &FilterSelection,
    threshold: Threshold,
) -> MetricRecord {
    let mut view = full.clone();
    view.retain(|field, _| selection.contains(field));
    filter_by_threshold(&mut view, threshold);

    debug!(
        "Built view with {} of {} fields at threshold {}",
        view.len(),
        full.len(),
        threshold
    );
    view
}

/// Turn a snake_case field name into a display label.
///
/// `largest_contentful_paint` becomes `Largest Contentful Paint`.
pub fn title_case(name: &str) -> String {
    LABEL_BREAKS
        .replace_all(name, |caps: &Captures| match caps.get(1) {
            Some(first) => first.as_str().to_uppercase(),
            None => format!(" {}", caps[2].to_uppercase()),
        })
        .into_owned()
}

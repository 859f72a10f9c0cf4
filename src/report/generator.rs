//! Markdown and JSON report generation.
//!
//! This module turns the canonical metric record plus the current field
//! selection and threshold into a rendered report.

use crate::analysis::{build_view, collect_scalar_leaves, is_empty, title_case};
use crate::models::{
    FilterSelection, MetricRecord, MetricValue, PerformanceReport, ReportMetadata, Threshold,
};
use anyhow::Result;

/// Assemble a report from the canonical record.
///
/// The shown metrics are a fresh filtered view; `full` is left untouched.
pub fn build_report(
    full: &MetricRecord,
    metadata: ReportMetadata,
    selection: FilterSelection,
    threshold: Threshold,
) -> PerformanceReport {
    PerformanceReport {
        metadata,
        fields: full.keys().cloned().collect(),
        metrics: build_view(full, &selection, threshold),
        available_thresholds: collect_scalar_leaves(full),
        selected_fields: selection,
        threshold,
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &PerformanceReport) -> String {
    let mut output = String::new();

    output.push_str("# Performance Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_filters_section(report));
    output.push_str(&generate_threshold_section(report));
    output.push_str(&generate_metrics_section(report));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Sources:** {}\n", metadata.sources.join(", ")));
    if let Some(platform) = metadata.platform {
        section.push_str(&format!("- **Platform:** {}\n", platform));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if metadata.averaged {
        section.push_str(&format!(
            "- **Aggregation:** average of {} sources\n",
            metadata.sources.len()
        ));
    }
    section.push('\n');

    section
}

/// Generate the field checklist.
fn generate_filters_section(report: &PerformanceReport) -> String {
    if report.fields.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Data Display Filters\n\n");

    for field in &report.fields {
        let mark = if report.selected_fields.contains(field) {
            "x"
        } else {
            " "
        };
        section.push_str(&format!("- [{}] {}\n", mark, title_case(field)));
    }
    section.push('\n');

    section
}

/// Generate the threshold section.
fn generate_threshold_section(report: &PerformanceReport) -> String {
    let mut section = String::new();

    section.push_str("## Sort by Threshold\n\n");
    if report.threshold.is_none() {
        section.push_str("- **Active threshold:** none\n");
    } else {
        section.push_str(&format!("- **Active threshold:** {}\n", report.threshold));
    }

    if !report.available_thresholds.is_empty() {
        let values: Vec<String> = report
            .available_thresholds
            .iter()
            .map(|v| v.to_string())
            .collect();
        section.push_str(&format!("- **Available values:** {}\n", values.join(", ")));
    }
    section.push('\n');

    section
}

/// Generate the metrics section.
fn generate_metrics_section(report: &PerformanceReport) -> String {
    let mut section = String::new();

    if report.metadata.averaged {
        section.push_str("## Summary of all URLs\n\n");
    } else {
        section.push_str("## Metrics\n\n");
    }

    if report.metrics.is_empty() {
        section.push_str("No metrics to display.\n\n");
        return section;
    }

    for (field, value) in &report.metrics {
        section.push_str(&format!("### {}\n\n", title_case(field)));
        match value {
            MetricValue::Scalar(scalar) => section.push_str(&format!("{}\n", scalar)),
            _ if is_empty(Some(value)) => section.push_str("_No values above threshold._\n"),
            _ => render_children(value, 0, &mut section),
        }
        section.push('\n');
    }

    section
}

/// Render the children of a record or sequence as a nested list.
fn render_children(value: &MetricValue, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);

    match value {
        MetricValue::Record(record) => {
            for (key, child) in record {
                match child {
                    MetricValue::Scalar(scalar) => {
                        out.push_str(&format!("{}- **{}:** {}\n", indent, title_case(key), scalar))
                    }
                    _ => {
                        out.push_str(&format!("{}- **{}**\n", indent, title_case(key)));
                        render_children(child, depth + 1, out);
                    }
                }
            }
        }
        // Sequence elements carry no label of their own.
        MetricValue::Sequence(items) => {
            for item in items {
                match item {
                    MetricValue::Scalar(scalar) => {
                        out.push_str(&format!("{}- {}\n", indent, scalar))
                    }
                    _ => {
                        out.push_str(&format!("{}-\n", indent));
                        render_children(item, depth + 1, out);
                    }
                }
            }
        }
        MetricValue::Scalar(_) => {}
    }
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by PerfReport from Chrome UX Report field data*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &PerformanceReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Platform;
    use chrono::Utc;

    fn full_record() -> MetricRecord {
        serde_json::from_str(
            r#"{
                "cumulative_layout_shift": {"percentiles": {"p75": "0.05"}},
                "largest_contentful_paint": {
                    "histogram": [
                        {"start": 0, "end": 2500, "density": 0.7},
                        {"start": 2500, "density": 0.3}
                    ],
                    "percentiles": {"p75": 2100}
                }
            }"#,
        )
        .unwrap()
    }

    fn metadata(averaged: bool) -> ReportMetadata {
        ReportMetadata {
            sources: vec![
                "https://a.example.com".to_string(),
                "https://b.example.com".to_string(),
            ],
            platform: Some(Platform::Phone),
            generated_at: Utc::now(),
            averaged,
        }
    }

    #[test]
    fn test_build_report() {
        let full = full_record();
        let selection = FilterSelection::from_fields(["largest_contentful_paint"]);

        let report = build_report(&full, metadata(true), selection, Threshold::new(1.0));

        assert_eq!(
            report.fields,
            vec!["cumulative_layout_shift", "largest_contentful_paint"]
        );
        assert_eq!(report.metrics.len(), 1);
        assert_eq!(
            report.available_thresholds,
            vec![0.0, 0.05, 0.3, 0.7, 2100.0, 2500.0]
        );
        // The canonical record still holds the values filtered out of the view.
        assert!(full.contains_key("cumulative_layout_shift"));
    }

    #[test]
    fn test_generate_markdown_report() {
        let full = full_record();
        let report = build_report(
            &full,
            metadata(true),
            FilterSelection::from_fields(["largest_contentful_paint"]),
            Threshold::NONE,
        );

        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# Performance Report"));
        assert!(markdown.contains("- **Platform:** PHONE"));
        assert!(markdown.contains("- [ ] Cumulative Layout Shift"));
        assert!(markdown.contains("- [x] Largest Contentful Paint"));
        assert!(markdown.contains("## Summary of all URLs"));
        assert!(markdown.contains("### Largest Contentful Paint"));
        assert!(markdown.contains("- **Histogram**"));
        assert!(markdown.contains("    - **Density:** 0.7"));
        assert!(markdown.contains("  - **P75:** 2100"));
        assert!(!markdown.contains("### Cumulative Layout Shift"));
    }

    #[test]
    fn test_single_source_heading() {
        let report = build_report(
            &full_record(),
            metadata(false),
            FilterSelection::default(),
            Threshold::NONE,
        );

        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("## Metrics"));
        assert!(markdown.contains("No metrics to display."));
        assert!(!markdown.contains("Summary of all URLs"));
    }

    #[test]
    fn test_fully_filtered_metric_is_still_listed() {
        let full = full_record();
        let report = build_report(
            &full,
            metadata(false),
            FilterSelection::all_of(&full),
            Threshold::new(1.0),
        );

        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("### Cumulative Layout Shift"));
        assert!(markdown.contains("- **Active threshold:** 1"));
    }

    #[test]
    fn test_sequence_of_scalars() {
        let mut full = MetricRecord::new();
        full.insert(
            "samples".to_string(),
            MetricValue::Sequence(vec![MetricValue::from(1.0), MetricValue::from("2.50")]),
        );
        let report = build_report(
            &full,
            metadata(false),
            FilterSelection::all_of(&full),
            Threshold::NONE,
        );

        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("- 1\n- 2.50\n"));
    }

    #[test]
    fn test_generate_json_report() {
        let full = full_record();
        let report = build_report(
            &full,
            metadata(true),
            FilterSelection::all_of(&full),
            Threshold::NONE,
        );

        let json = generate_json_report(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["metadata"]["platform"], "PHONE");
        assert_eq!(value["threshold"], 0.0);
        assert_eq!(
            value["metrics"]["cumulative_layout_shift"]["percentiles"]["p75"],
            "0.05"
        );
        assert_eq!(value["selected_fields"].as_array().unwrap().len(), 2);
    }
}

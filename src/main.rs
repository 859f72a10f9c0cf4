//! PerfReport - Chrome UX field metrics, averaged and filtered
//!
//! A CLI tool that fetches real-user performance metrics for one or more
//! origins, averages them into a single summary, filters the result by
//! field and threshold, and writes a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid origin, failed fetch, config error, etc.)

mod analysis;
mod cli;
mod config;
mod models;
mod report;
mod source;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, ReportConfig, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{FilterSelection, MetricRecord, ReportMetadata};
use source::{CruxClient, Platform};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("PerfReport v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Report failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .perfreport.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Set CRUX_API_KEY (or api.api_key) before querying the API.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete report workflow.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let source_count = args.source_count();
    if source_count > config.api.max_sources {
        bail!(
            "At most {} sources can be compared at once (got {})",
            config.api.max_sources,
            source_count
        );
    }

    // Step 1: Gather one record per source
    let (records, sources, platform) = gather_records(&args, &config).await?;

    // Step 2: Merge into the canonical record
    let averaged = records.len() > 1;
    let full: MetricRecord = if averaged {
        info!("Averaging {} records", records.len());
        analysis::average(&records)
    } else {
        records.into_iter().next().unwrap_or_default()
    };

    if analysis::record_is_empty(&full) {
        warn!("No metrics available for the requested sources");
    }

    if args.list_thresholds {
        for value in analysis::collect_scalar_leaves(&full) {
            println!("{}", value);
        }
        return Ok(());
    }

    // Step 3: Filter and render
    let selection = resolve_selection(&full, &config.report);
    let metadata = ReportMetadata {
        sources,
        platform,
        generated_at: Utc::now(),
        averaged,
    };
    let report = report::build_report(&full, metadata, selection, config.report.threshold);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    std::fs::write(&config.general.output, &output)
        .with_context(|| format!("Failed to write report to {}", config.general.output))?;

    if !args.quiet {
        println!("\n📊 Report Summary:");
        println!("   Sources: {}", report.metadata.sources.len());
        println!(
            "   Metrics shown: {} of {}",
            report.metrics.len(),
            report.fields.len()
        );
        println!("   Threshold: {}", report.threshold);
        println!("\n✅ Report saved to: {}", config.general.output);
    }

    Ok(())
}

/// Read records from local files or fetch them from the API.
async fn gather_records(
    args: &Args,
    config: &Config,
) -> Result<(Vec<MetricRecord>, Vec<String>, Option<Platform>)> {
    if !args.input.is_empty() {
        let mut records = Vec::with_capacity(args.input.len());
        for path in &args.input {
            info!("Loading records from {}", path.display());
            records.push(source::load_record_file(path)?);
        }
        let sources = args.input.iter().map(|p| p.display().to_string()).collect();
        return Ok((records, sources, None));
    }

    let platform = config.report.platform;
    let client = CruxClient::new(&config.api)?;

    let spinner = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Querying {} origin(s) on {}", args.urls.len(), platform));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    };

    let result = source::collect_records(&client, &args.urls, platform).await;
    spinner.finish_and_clear();

    match result {
        Ok(records) => Ok((records, args.urls.clone(), Some(platform))),
        Err(failures) => {
            for failure in &failures {
                eprintln!("   {}", failure);
            }
            bail!(
                "{} of {} source(s) could not be fetched",
                failures.len(),
                args.urls.len()
            )
        }
    }
}

/// Work out which top-level fields to show.
fn resolve_selection(full: &MetricRecord, report: &ReportConfig) -> FilterSelection {
    let mut selection = match report.fields {
        Some(ref fields) => {
            for field in fields.iter().filter(|f| !full.contains_key(*f)) {
                warn!("Unknown field '{}' ignored", field);
            }
            FilterSelection::from_fields(fields.iter().filter(|f| full.contains_key(*f)).cloned())
        }
        None => FilterSelection::all_of(full),
    };

    for field in &report.hidden_fields {
        if selection.contains(field) {
            selection.toggle(field);
        }
    }

    if selection.is_empty() && !full.is_empty() {
        warn!("No fields selected; the report will list no metrics");
    }
    debug!("Showing {} field(s)", selection.len());
    selection
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> MetricRecord {
        serde_json::from_str(r#"{"cls": {"p75": 1}, "fid": {"p75": 2}, "lcp": {"p75": 3}}"#)
            .unwrap()
    }

    #[test]
    fn test_resolve_selection_defaults_to_all() {
        let selection = resolve_selection(&full(), &ReportConfig::default());
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn test_resolve_selection_ignores_unknown_fields() {
        let report = ReportConfig {
            fields: Some(vec!["lcp".to_string(), "ttfb".to_string()]),
            ..ReportConfig::default()
        };

        let selection = resolve_selection(&full(), &report);

        assert_eq!(selection, FilterSelection::from_fields(["lcp"]));
    }

    #[test]
    fn test_resolve_selection_hides_fields() {
        let report = ReportConfig {
            hidden_fields: vec!["fid".to_string(), "ttfb".to_string()],
            ..ReportConfig::default()
        };

        let selection = resolve_selection(&full(), &report);

        assert_eq!(selection, FilterSelection::from_fields(["cls", "lcp"]));
    }
}

//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Threshold;
use crate::source::Platform;
use clap::Parser;
use std::path::PathBuf;

/// PerfReport - Chrome UX field metrics, averaged and filtered
///
/// Query real-user performance metrics for up to three origins, average
/// them into one summary, and write a Markdown or JSON report.
///
/// Examples:
///   perfreport --url https://www.example.com
///   perfreport --url https://a.example.com,https://b.example.com --platform desktop
///   perfreport --input saved.json --threshold 100 --fields largest_contentful_paint
///   perfreport --url https://www.example.com --list-thresholds
///   perfreport --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Origin(s) to query (comma-separated or repeated)
    ///
    /// Each must be an https URL, e.g. https://www.example.com.
    #[arg(
        short,
        long = "url",
        value_name = "URL",
        value_delimiter = ',',
        required_unless_present_any = ["input", "init_config"],
        conflicts_with = "input"
    )]
    pub urls: Vec<String>,

    /// Local JSON record file(s) to use instead of querying the API
    ///
    /// A file may hold a bare metrics object or a saved API response.
    #[arg(short, long, value_name = "FILE", value_delimiter = ',')]
    pub input: Vec<PathBuf>,

    /// Device class to query
    #[arg(short, long, value_enum)]
    pub platform: Option<Platform>,

    /// Hide scalar values below this threshold (0 shows everything)
    #[arg(short, long, value_name = "VALUE")]
    pub threshold: Option<Threshold>,

    /// Top-level metrics to include (comma-separated)
    ///
    /// Example: --fields largest_contentful_paint,first_input_delay
    #[arg(long, value_name = "FIELDS", value_delimiter = ',')]
    pub fields: Option<Vec<String>>,

    /// Top-level metrics to hide (comma-separated)
    #[arg(long, value_name = "FIELDS", value_delimiter = ',')]
    pub hide: Option<Vec<String>>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Chrome UX Report API key
    #[arg(long, env = "CRUX_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Chrome UX Report API endpoint URL
    #[arg(long, env = "PERFREPORT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .perfreport.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the selectable threshold values and exit
    #[arg(long)]
    pub list_thresholds: bool,

    /// Generate a default .perfreport.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Number of records this run will gather.
    pub fn source_count(&self) -> usize {
        if self.input.is_empty() {
            self.urls.len()
        } else {
            self.input.len()
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.source_count() == 0 {
            return Err("At least one --url or --input is required".to_string());
        }

        if let Some(ref endpoint) = self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err("Endpoint URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(threshold) = self.threshold {
            if threshold.value() < 0.0 {
                return Err("Threshold must not be negative".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        for path in &self.input {
            if !path.is_file() {
                return Err(format!("Input file does not exist: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

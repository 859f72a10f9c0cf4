//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.perfreport.toml` files.

use crate::models::Threshold;
use crate::source::Platform;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".perfreport.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Chrome UX Report API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "perf_report.md".to_string()
}

/// Chrome UX Report API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// `records:queryRecord` endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key. Usually supplied through `CRUX_API_KEY` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of origins compared in one run.
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            timeout_seconds: default_timeout(),
            max_sources: default_max_sources(),
        }
    }
}

fn default_endpoint() -> String {
    "https://chromeuxreport.googleapis.com/v1/records:queryRecord".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_sources() -> usize {
    3
}

/// Report generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Device class to query.
    #[serde(default)]
    pub platform: Platform,

    /// Scalars below this value are hidden. 0 shows everything.
    #[serde(default)]
    pub threshold: Threshold,

    /// Top-level fields to show. All fields when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,

    /// Top-level fields to hide, applied after `fields`.
    #[serde(default)]
    pub hidden_fields: Vec<String>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(ref endpoint) = args.endpoint {
            self.api.endpoint = endpoint.clone();
        }
        if let Some(ref api_key) = args.api_key {
            self.api.api_key = Some(api_key.clone());
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }

        if let Some(platform) = args.platform {
            self.report.platform = platform;
        }
        if let Some(threshold) = args.threshold {
            self.report.threshold = threshold;
        }
        if let Some(ref fields) = args.fields {
            self.report.fields = Some(fields.clone());
        }
        if let Some(ref hidden) = args.hide {
            self.report.hidden_fields = hidden.clone();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "perf_report.md");
        assert_eq!(config.api.max_sources, 3);
        assert_eq!(config.report.platform, Platform::Phone);
        assert!(config.report.threshold.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "vitals.md"

[api]
timeout_seconds = 10

[report]
platform = "DESKTOP"
threshold = 0.5
fields = ["largest_contentful_paint", "cumulative_layout_shift"]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "vitals.md");
        assert_eq!(config.api.timeout_seconds, 10);
        assert!(config.api.endpoint.contains("records:queryRecord"));
        assert_eq!(config.report.platform, Platform::Desktop);
        assert_eq!(config.report.threshold, Threshold::new(0.5));
        assert_eq!(
            config.report.fields,
            Some(vec![
                "largest_contentful_paint".to_string(),
                "cumulative_layout_shift".to_string()
            ])
        );
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[report]"));
        assert!(!toml_str.contains("api_key"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.api.max_sources, 3);
    }

    #[test]
    fn test_explicit_args_override_config() {
        let mut config: Config = toml::from_str(
            r#"
[report]
platform = "TABLET"
threshold = 5.0
"#,
        )
        .unwrap();

        let args = Args::parse_from([
            "perfreport",
            "--url",
            "https://www.example.com",
            "--threshold",
            "100",
        ]);
        config.merge_with_args(&args);

        assert_eq!(config.report.platform, Platform::Tablet);
        assert_eq!(config.report.threshold, Threshold::new(100.0));
    }
}

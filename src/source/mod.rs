//! Metric record sources.
//!
//! Records come either from the Chrome UX Report API (one request per
//! origin, issued concurrently) or from local JSON files.

pub mod crux;
pub mod error;
pub mod file;

pub use crux::CruxClient;
pub use error::{FetchFailure, SourceError};
pub use file::load_record_file;

use crate::models::MetricRecord;
use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::{info, warn};

static ORIGIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https://(www\.)?[-a-zA-Z0-9@:%._\+~#=]{2,256}\.[a-z]{2,6}\b([-a-zA-Z0-9@:%_\+.~#?&//=]*)",
    )
    .expect("origin pattern is valid")
});

/// Device class the field data was collected on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    #[default]
    Phone,
    Tablet,
    Desktop,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Phone => write!(f, "PHONE"),
            Platform::Tablet => write!(f, "TABLET"),
            Platform::Desktop => write!(f, "DESKTOP"),
        }
    }
}

/// Anything that can produce a metric record for an origin.
#[async_trait]
pub trait RecordSource: Sync {
    async fn fetch(&self, origin: &str, platform: Platform) -> Result<MetricRecord, SourceError>;
}

/// Check that an origin looks like an https URL.
pub fn validate_origin(origin: &str) -> Result<(), SourceError> {
    if ORIGIN_PATTERN.is_match(origin) {
        Ok(())
    } else {
        Err(SourceError::InvalidOrigin(origin.to_string()))
    }
}

/// Fetch a record for every origin concurrently.
///
/// Origins are validated first; if any is malformed nothing is fetched.
/// Returns the records in origin order, or every failure if at least one
/// fetch failed.
pub async fn collect_records<S: RecordSource>(
    source: &S,
    origins: &[String],
    platform: Platform,
) -> Result<Vec<MetricRecord>, Vec<FetchFailure>> {
    let invalid: Vec<FetchFailure> = origins
        .iter()
        .filter_map(|origin| {
            validate_origin(origin).err().map(|error| FetchFailure {
                origin: origin.clone(),
                error,
            })
        })
        .collect();
    if !invalid.is_empty() {
        return Err(invalid);
    }

    info!("Fetching {} origin(s) for {}", origins.len(), platform);
    let results = join_all(origins.iter().map(|origin| source.fetch(origin, platform))).await;

    let mut records = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (origin, result) in origins.iter().zip(results) {
        match result {
            Ok(record) => records.push(record),
            Err(error) => {
                warn!("Fetch failed for {}: {}", origin, error);
                failures.push(FetchFailure {
                    origin: origin.clone(),
                    error,
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(records)
    } else {
        Err(failures)
    }
}

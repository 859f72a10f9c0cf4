//! Local record files.
//!
//! A file holds either a bare metrics tree or a saved API response whose
//! metrics live under `record.metrics`.

use crate::models::MetricRecord;
use crate::source::crux::QueryResponse;
use crate::source::SourceError;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Load one metric record from a JSON file.
pub fn load_record_file(path: &Path) -> Result<MetricRecord, SourceError> {
    let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let json: Value = serde_json::from_str(&content)?;
    if json.get("record").is_some_and(Value::is_object) {
        debug!("{} holds an API response", path.display());
        let response: QueryResponse = serde_json::from_value(json)?;
        Ok(response.record.metrics)
    } else {
        Ok(serde_json::from_value(json)?)
    }
}

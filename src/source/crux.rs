//! Chrome UX Report API client.
//!
//! Queries `records:queryRecord` for one origin and form factor and
//! extracts the `record.metrics` tree from the response.

use crate::config::ApiConfig;
use crate::models::MetricRecord;
use crate::source::{Platform, RecordSource, SourceError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Query body sent to the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    form_factor: Platform,
    origin: &'a str,
}

/// Successful response. Every level may be missing.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub record: QueryRecord,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueryRecord {
    #[serde(default)]
    pub metrics: MetricRecord,
}

/// Error response body.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Client for the Chrome UX Report API.
pub struct CruxClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl CruxClient {
    /// Create a client from the API settings.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .context("No API key configured. Pass --api-key or set CRUX_API_KEY")?;

        info!("Using Chrome UX Report endpoint {}", config.endpoint);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl RecordSource for CruxClient {
    async fn fetch(&self, origin: &str, platform: Platform) -> Result<MetricRecord, SourceError> {
        debug!("Querying {} for {}", origin, platform);

        let response = self
            .http_client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&QueryRequest {
                form_factor: platform,
                origin,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(decode_error(status, &body));
        }

        decode_metrics(&body)
    }
}

/// Extract `record.metrics` from a successful response body.
pub fn decode_metrics(body: &str) -> Result<MetricRecord, SourceError> {
    let response: QueryResponse = serde_json::from_str(body)?;
    Ok(response.record.metrics)
}

/// Turn a failed response into a [`SourceError::Api`].
///
/// Falls back to the HTTP status when the body is not the API's error shape.
fn decode_error(status: reqwest::StatusCode, body: &str) -> SourceError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error }) => SourceError::Api {
            code: error.code.unwrap_or(status.as_u16()),
            status: error.status,
            message: error.message,
        },
        Err(_) => SourceError::Api {
            code: status.as_u16(),
            status: status.canonical_reason().unwrap_or_default().to_string(),
            message: body.trim().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricValue;
    use reqwest::StatusCode;

    #[test]
    fn test_request_body() {
        let body = serde_json::to_value(QueryRequest {
            form_factor: Platform::Desktop,
            origin: "https://www.example.com",
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({"formFactor": "DESKTOP", "origin": "https://www.example.com"})
        );
    }

    #[test]
    fn test_decode_metrics() {
        let body = r#"{
            "record": {
                "key": {"origin": "https://www.example.com", "formFactor": "PHONE"},
                "metrics": {
                    "largest_contentful_paint": {
                        "histogram": [{"start": 0, "end": 2500, "density": 0.75}],
                        "percentiles": {"p75": 2100}
                    }
                }
            },
            "urlNormalizationDetails": {}
        }"#;

        let metrics = decode_metrics(body).unwrap();

        let lcp = metrics["largest_contentful_paint"].as_record().unwrap();
        assert_eq!(
            lcp["percentiles"].as_record().unwrap()["p75"],
            MetricValue::from(2100.0)
        );
    }

    #[test]
    fn test_decode_metrics_defaults_to_empty() {
        assert!(decode_metrics("{}").unwrap().is_empty());
        assert!(decode_metrics(r#"{"record": {}}"#).unwrap().is_empty());
    }

    #[test]
    fn test_decode_metrics_rejects_garbage() {
        assert!(matches!(
            decode_metrics("<html>"),
            Err(SourceError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_api_error() {
        let body = r#"{"error": {"code": 404, "message": "chrome ux report data not found", "status": "NOT_FOUND"}}"#;

        match decode_error(StatusCode::NOT_FOUND, body) {
            SourceError::Api {
                code,
                status,
                message,
            } => {
                assert_eq!(code, 404);
                assert_eq!(status, "NOT_FOUND");
                assert_eq!(message, "chrome ux report data not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_unstructured_error() {
        match decode_error(StatusCode::BAD_GATEWAY, "upstream down\n") {
            SourceError::Api {
                code,
                status,
                message,
            } => {
                assert_eq!(code, 502);
                assert_eq!(status, "Bad Gateway");
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = ApiConfig {
            api_key: None,
            ..ApiConfig::default()
        };
        assert!(CruxClient::new(&config).is_err());
    }
}

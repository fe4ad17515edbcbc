// Source fetcher: HTTP GET of a JSON source with lenient shape handling

use crate::config::FetcherConfig;
use crate::errors::EtlError;
use crate::models::Record;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

/// Fetches one source URL and decodes it into records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<Record>, EtlError>;
}

/// reqwest-backed fetcher
pub struct HttpSourceFetcher {
    client: Client,
    max_error_body_bytes: usize,
}

impl HttpSourceFetcher {
    /// Create a new fetcher from configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, EtlError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| EtlError::InvalidInput(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_error_body_bytes: config.max_error_body_bytes,
        })
    }

    /// Read at most `limit` bytes of an error response body
    async fn read_snippet(mut response: Response, limit: usize) -> String {
        let mut buf: Vec<u8> = Vec::with_capacity(limit.min(4096));

        while buf.len() < limit {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let take = (limit - buf.len()).min(chunk.len());
                    buf.extend_from_slice(&chunk[..take]);
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(error = %e, "Failed to read error response body");
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<Record>, EtlError> {
        if url.trim().is_empty() {
            return Err(EtlError::InvalidInput("empty data source url".to_string()));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EtlError::SourceUnreachable(e.to_string()))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Source responded");

        if !status.is_success() {
            let body_snippet = Self::read_snippet(response, self.max_error_body_bytes).await;
            return Err(EtlError::SourceHttpError {
                status: status.as_u16(),
                body_snippet,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| EtlError::SourceUnreachable(format!("Failed to read body: {}", e)))?;

        let payload: Value = serde_json::from_slice(&body)
            .map_err(|e| EtlError::SourceShapeError(format!("json decode failed: {}", e)))?;

        let records = records_from_payload(payload)?;
        tracing::debug!(records = records.len(), "Source payload decoded");
        Ok(records)
    }
}

/// Accept an array of objects or a single object; anything else is a shape error.
pub fn records_from_payload(payload: Value) -> Result<Vec<Record>, EtlError> {
    match payload {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(map) => Ok(map),
                other => Err(EtlError::SourceShapeError(format!(
                    "array item {} is not an object (found {})",
                    i,
                    json_kind(&other)
                ))),
            })
            .collect(),
        Value::Object(map) => Ok(vec![map]),
        other => Err(EtlError::SourceShapeError(format!(
            "expected object or array of objects, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

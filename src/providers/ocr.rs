//! OCR.space Text Extractor
//!
//! `GET {ocr_api_url}?apikey=..&url=<image>` and concatenate every
//! `ParsedResults[].ParsedText`.

use async_trait::async_trait;
use eyre::{eyre, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::core::pipeline::TextExtractor;
use crate::utils::constants::{OCR_TIMEOUT_SECS, USER_AGENT};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrResponse {
    #[serde(default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(default)]
    is_errored_on_processing: bool,
    /// String or list of strings depending on the failure
    #[serde(default)]
    error_message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

/// OCR.space client
pub struct OcrSpaceClient {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OcrSpaceClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(OCR_TIMEOUT_SECS))
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            client,
        })
    }
}

#[async_trait]
impl TextExtractor for OcrSpaceClient {
    async fn extract_text(&self, image_url: &str) -> Result<String> {
        let resp = self
            .client
            .get(&self.api_url)
            .query(&[("apikey", self.api_key.as_str()), ("url", image_url)])
            .send()
            .await
            .map_err(|e| eyre!("OCR request failed: {}", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(eyre!("OCR HTTP error: {}", status));
        }

        let body: OcrResponse = resp
            .json()
            .await
            .map_err(|e| eyre!("Invalid OCR response: {}", e))?;
        let text = collect_text(body)?;
        debug!(chars = text.len(), "OCR text received");
        Ok(text)
    }
}

fn collect_text(body: OcrResponse) -> Result<String> {
    if body.is_errored_on_processing {
        let detail = match body.error_message {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => "unknown error".to_string(),
        };
        return Err(eyre!("OCR processing failed: {}", detail));
    }

    Ok(body
        .parsed_results
        .into_iter()
        .map(|r| r.parsed_text)
        .filter(|t| !t.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

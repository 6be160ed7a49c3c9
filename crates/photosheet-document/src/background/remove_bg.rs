// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// remove.bg HTTP client.

use std::time::Duration;

use photosheet_core::AppConfig;
use photosheet_core::error::{PhotosheetError, Result};
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, instrument, warn};

use super::SegmentationService;

/// Longest slice of an error body quoted back to the user.
const MAX_BODY_EXCERPT: usize = 200;

/// Background removal through the remove.bg v1 API.
#[derive(Clone)]
pub struct RemoveBgClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout_secs: u64,
}

impl RemoveBgClient {
    /// Build a client from configuration. Fails when no API key is set.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config.remove_bg_api_key.clone().ok_or_else(|| {
            PhotosheetError::BackgroundService(
                "no API key configured (set PHOTOSHEET_REMOVE_BG_API_KEY)".into(),
            )
        })?;
        Self::new(
            config.remove_bg_endpoint.clone(),
            api_key,
            config.remove_bg_timeout_secs,
        )
    }

    pub fn new(endpoint: String, api_key: String, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PhotosheetError::BackgroundService(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            http,
            endpoint,
            api_key,
            timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_transport_error(&self, err: reqwest::Error) -> PhotosheetError {
        let detail = if err.is_timeout() {
            format!("request timed out after {}s", self.timeout_secs)
        } else if err.is_connect() {
            "could not reach the background service".to_string()
        } else {
            format!("request failed: {err}")
        };
        warn!(error = %err, "background service transport error");
        PhotosheetError::BackgroundService(detail)
    }
}

impl std::fmt::Debug for RemoveBgClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoveBgClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SegmentationService for RemoveBgClient {
    #[instrument(skip(self, png), fields(endpoint = %self.endpoint, bytes_len = png.len()))]
    async fn remove_background(&self, png: Vec<u8>) -> Result<Vec<u8>> {
        let part = Part::bytes(png)
            .file_name("image.png")
            .mime_str("image/png")
            .map_err(|e| PhotosheetError::BackgroundService(format!("bad upload part: {e}")))?;
        let form = Form::new()
            .part("image_file", part)
            .text("size", "auto")
            .text("format", "png");

        debug!("submitting image for segmentation");
        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Api-Key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "background service refused request");
            return Err(PhotosheetError::BackgroundService(describe_status(
                status.as_u16(),
                &body,
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        if bytes.is_empty() {
            return Err(PhotosheetError::BackgroundService(
                "malformed response: empty body".into(),
            ));
        }
        info!(bytes_len = bytes.len(), "segmentation result received");
        Ok(bytes.to_vec())
    }
}

/// User-facing text for a non-2xx reply.
pub fn describe_status(status: u16, body: &str) -> String {
    match status {
        401 | 403 => format!("HTTP {status}: authentication rejected, check the API key"),
        402 | 429 => format!("HTTP {status}: quota exhausted or rate limited"),
        _ => {
            let excerpt: String = body.trim().chars().take(MAX_BODY_EXCERPT).collect();
            if excerpt.is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {excerpt}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_and_quota_statuses_have_fixed_text() {
        assert!(describe_status(401, "").contains("API key"));
        assert!(describe_status(403, "{}").contains("authentication"));
        assert!(describe_status(402, "").contains("quota"));
        assert!(describe_status(429, "").contains("rate limited"));
    }

    #[test]
    fn other_statuses_quote_a_bounded_body() {
        let body = "x".repeat(1000);
        let text = describe_status(500, &body);
        assert!(text.starts_with("HTTP 500: "));
        assert_eq!(text.len(), "HTTP 500: ".len() + MAX_BODY_EXCERPT);
        assert_eq!(describe_status(502, "  "), "HTTP 502");
    }

    #[test]
    fn missing_api_key_is_reported() {
        let err = RemoveBgClient::from_config(&AppConfig::default()).unwrap_err();
        match err {
            PhotosheetError::BackgroundService(msg) => assert!(msg.contains("API key")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn debug_redacts_key() {
        let config = AppConfig {
            remove_bg_api_key: Some("topsecret".into()),
            ..AppConfig::default()
        };
        let client = RemoveBgClient::from_config(&config).unwrap();
        assert!(!format!("{client:?}").contains("topsecret"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_service_error() {
        let client =
            RemoveBgClient::new("http://127.0.0.1:9/removebg".into(), "key".into(), 5).unwrap();
        let err = client.remove_background(vec![1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, PhotosheetError::BackgroundService(_)));
    }
}

// SPDX-FileCopyrightText: 2026 Tixbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! QR decoding through an HTTP read-qr-code service.
//!
//! The image is uploaded as multipart field `file`; the service answers with
//! `[{"symbol": [{"data": ..., "error": ...}]}]`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, warn};

use tixbot_config::model::DecoderConfig;
use tixbot_core::{AdapterType, CodeDecoder, HealthStatus, PluginAdapter, TixbotError};

#[derive(Debug, Deserialize)]
struct ScanResult {
    #[serde(default)]
    symbol: Vec<Symbol>,
}

#[derive(Debug, Deserialize)]
struct Symbol {
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Decoder backed by a qrserver-compatible HTTP endpoint.
pub struct QrServerDecoder {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl QrServerDecoder {
    pub fn new(config: &DecoderConfig) -> Result<Self, TixbotError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TixbotError::Internal(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            timeout,
        })
    }
}

/// Pull the decoded text out of a service response.
fn extract_code(results: Vec<ScanResult>) -> Result<String, TixbotError> {
    let symbol = results
        .into_iter()
        .next()
        .and_then(|r| r.symbol.into_iter().next())
        .ok_or_else(|| TixbotError::Internal("decoder returned no symbols".into()))?;

    if let Some(error) = symbol.error.filter(|e| !e.is_empty()) {
        return Err(TixbotError::Validation(error));
    }
    match symbol.data.map(|d| d.trim().to_string()) {
        Some(code) if !code.is_empty() => Ok(code),
        _ => Err(TixbotError::Validation("no data in code".into())),
    }
}

#[async_trait]
impl PluginAdapter for QrServerDecoder {
    fn name(&self) -> &str {
        "qrserver"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Decoder
    }

    async fn health_check(&self) -> Result<HealthStatus, TixbotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), TixbotError> {
        Ok(())
    }
}

#[async_trait]
impl CodeDecoder for QrServerDecoder {
    async fn decode(&self, image: &[u8]) -> Result<String, TixbotError> {
        let part = Part::bytes(image.to_vec())
            .file_name("qrcode.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| TixbotError::Internal(format!("invalid upload part: {e}")))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TixbotError::Timeout {
                        duration: self.timeout,
                    }
                } else {
                    TixbotError::Internal(format!("decoder request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "decoder returned an error status");
            return Err(TixbotError::Internal(format!("decoder returned HTTP {status}")));
        }

        let results: Vec<ScanResult> = response
            .json()
            .await
            .map_err(|e| TixbotError::Internal(format!("unexpected decoder response: {e}")))?;
        let code = extract_code(results)?;
        debug!(code = code.as_str(), "code decoded");
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn decoder(server: &MockServer) -> QrServerDecoder {
        QrServerDecoder::new(&DecoderConfig {
            endpoint: format!("{}/v1/read-qr-code/", server.uri()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    async fn respond(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/v1/read-qr-code/"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn decodes_and_trims_symbol_data() {
        let server = MockServer::start().await;
        respond(
            &server,
            ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"type": "qrcode", "symbol": [{"seq": 0, "data": " ch_42 \n", "error": null}]}
            ])),
        )
        .await;

        assert_eq!(decoder(&server).decode(b"jpeg").await.unwrap(), "ch_42");
    }

    #[tokio::test]
    async fn symbol_error_is_a_validation_failure() {
        let server = MockServer::start().await;
        respond(
            &server,
            ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"symbol": [{"data": null, "error": "could not find/read QR Code"}]}
            ])),
        )
        .await;

        let err = decoder(&server).decode(b"jpeg").await.unwrap_err();
        match err {
            TixbotError::Validation(detail) => assert_eq!(detail, "could not find/read QR Code"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn http_failure_is_not_a_validation_failure() {
        let server = MockServer::start().await;
        respond(&server, ResponseTemplate::new(503)).await;

        let err = decoder(&server).decode(b"jpeg").await.unwrap_err();
        assert!(matches!(err, TixbotError::Internal(_)));
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let server = MockServer::start().await;
        respond(
            &server,
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .await;
        let decoder = QrServerDecoder::new(&DecoderConfig {
            endpoint: format!("{}/v1/read-qr-code/", server.uri()),
            timeout_secs: 1,
        })
        .unwrap();

        let err = decoder.decode(b"jpeg").await.unwrap_err();
        assert!(matches!(err, TixbotError::Timeout { .. }));
    }

    #[test]
    fn empty_response_is_an_error() {
        assert!(matches!(extract_code(vec![]), Err(TixbotError::Internal(_))));
    }
}

//! Evidence image upload adapter
//!
//! The storage service is opaque: bytes go in, a secure URL comes back.
//! Failures are retryable by the caller; nothing here is persisted.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;

use config::GatewayConfig;
use types::{Result, WheelbaseError};

/// Seam for the evidence image storage service
#[async_trait]
pub trait EvidenceUploader: Send + Sync {
    /// Upload an image and return its secure URL.
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<String>;
}

/// HTTP implementation of the upload seam
#[derive(Debug, Clone)]
pub struct RestEvidenceUploader {
    upload_url: String,
    timeout_seconds: u64,
    http_client: Client,
}

impl RestEvidenceUploader {
    pub fn new(config: &GatewayConfig) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("wheelbase/0.1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            upload_url: config.upload_url.trim_end_matches('/').to_string(),
            timeout_seconds: config.timeout_seconds,
            http_client,
        }
    }
}

#[async_trait]
impl EvidenceUploader for RestEvidenceUploader {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<String> {
        if bytes.is_empty() {
            return Err(WheelbaseError::Validation(
                "evidence image is empty".to_string(),
            ));
        }

        let url = format!("{}/files?filename={}", self.upload_url, filename);
        let size = bytes.len();

        let response = timeout(
            Duration::from_secs(self.timeout_seconds),
            self.http_client
                .post(&url)
                .header("content-type", "application/octet-stream")
                .body(bytes)
                .send(),
        )
        .await
        .map_err(|_| WheelbaseError::UploadFailed("connection timeout".to_string()))?
        .map_err(|e| WheelbaseError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WheelbaseError::UploadFailed(format!(
                "HTTP error: {}",
                response.status().as_u16()
            )));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| WheelbaseError::UploadFailed(format!("invalid response: {}", e)))?;

        let secure_url = value
            .get("secureUrl")
            .or_else(|| value.get("secure_url"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                WheelbaseError::UploadFailed("response missing secure URL".to_string())
            })?;

        tracing::info!(filename, size, secure_url, "Evidence image uploaded");
        Ok(secure_url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_config(upload_url: String) -> GatewayConfig {
        GatewayConfig {
            base_url: "https://api.pay.test".to_string(),
            key_id: "k".to_string(),
            key_secret: "s".to_string(),
            upload_url,
            timeout_seconds: 5,
        }
    }

    #[tokio::test]
    async fn test_successful_upload_returns_secure_url() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "secureUrl": "https://cdn.test/evidence/front.jpg"
            })))
            .mount(&mock_server)
            .await;

        let uploader = RestEvidenceUploader::new(&test_config(mock_server.uri()));
        let url = uploader
            .upload("front.jpg", vec![0xff, 0xd8, 0xff])
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.test/evidence/front.jpg");
    }

    #[tokio::test]
    async fn test_failed_upload_is_retryable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let uploader = RestEvidenceUploader::new(&test_config(mock_server.uri()));
        let err = uploader
            .upload("rear.jpg", vec![0xff, 0xd8, 0xff])
            .await
            .unwrap_err();

        assert!(matches!(err, WheelbaseError::UploadFailed(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_payload_is_rejected_locally() {
        let uploader =
            RestEvidenceUploader::new(&test_config("https://uploads.test".to_string()));
        let err = uploader.upload("front.jpg", vec![]).await.unwrap_err();
        assert!(matches!(err, WheelbaseError::Validation(_)));
    }
}

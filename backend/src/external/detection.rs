//! Pest detection client
//!
//! Forwards scan media to the hosted detection model as a multipart upload.
//! Calls carry no timeout and are never retried.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{MediaFile, RawDetectionResponse};

use super::DetectionApi;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PestDetectionClient {
    endpoint: String,
    http_client: Client,
}

impl PestDetectionClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            http_client: Client::new(),
        }
    }
}

#[async_trait]
impl DetectionApi for PestDetectionClient {
    async fn detect(&self, bytes: Vec<u8>, media: MediaFile) -> AppResult<RawDetectionResponse> {
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(media.file_name)
            .mime_str(media.mime_type)
            .map_err(|e| AppError::AiDetectionError(format!("Invalid MIME type: {}", e)))?;
        let form = Form::new().part("file", part);

        tracing::info!(
            mime_type = media.mime_type,
            size,
            "Calling pest detection service"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::AiDetectionError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(%status, "Detection service returned an error");
            return Err(AppError::AiDetectionError(body));
        }

        let result: RawDetectionResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiDetectionError(format!("Failed to parse response: {}", e)))?;

        tracing::debug!(?result, "Detection result");
        Ok(result)
    }
}

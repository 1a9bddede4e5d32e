//! Object storage client
//!
//! Talks to a Supabase-style storage REST API. Objects live in the
//! `crop-scans` bucket and are addressed by key.

use async_trait::async_trait;
use reqwest::{header, Client};
use shared::STORAGE_BUCKET;

use super::ObjectStore;
use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl StorageClient {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, STORAGE_BUCKET, key)
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()> {
        let response = self
            .client
            .post(self.object_url(key))
            .bearer_auth(&self.service_key)
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StorageError(format!(
                "Upload failed with {}: {}",
                status, body
            )));
        }

        tracing::debug!(key, "Stored scan object");
        Ok(())
    }

    async fn download(&self, key: &str) -> AppResult<Vec<u8>> {
        let response = self
            .client
            .get(self.object_url(key))
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to download image: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StorageError(format!(
                "Failed to download image ({}): {}",
                status, body
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to download image: {}", e)))?;

        Ok(bytes.to_vec())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, STORAGE_BUCKET, key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_round_trips_through_key_extraction() {
        let client = StorageClient::new(&StorageConfig {
            base_url: "https://store.example/".into(),
            service_key: "key".into(),
        });
        let url = client.public_url("3f2a.webm");
        assert_eq!(
            url,
            "https://store.example/storage/v1/object/public/crop-scans/3f2a.webm"
        );
        assert_eq!(shared::storage_key_from_url(&url), Some("3f2a.webm"));
    }

    #[test]
    fn test_every_stored_object_url_yields_its_key() {
        let client = StorageClient::new(&StorageConfig {
            base_url: "http://localhost:54321".into(),
            service_key: String::new(),
        });
        for key in ["3f2a.jpg", "b1c9.mp4", "nested/frame-01.png"] {
            let url = client.public_url(key);
            assert_eq!(shared::storage_key_from_url(&url), Some(key), "{}", url);
        }
        assert_eq!(
            client.object_url("3f2a.jpg"),
            "http://localhost:54321/storage/v1/object/crop-scans/3f2a.jpg"
        );
    }
}

//! External API integrations
//!
//! The scan pipeline reaches object storage and the detection service through
//! the [`ObjectStore`] and [`DetectionApi`] traits so it can run against
//! in-memory fakes in tests.

pub mod detection;
pub mod storage;
pub mod weather;

use async_trait::async_trait;
use shared::{MediaFile, RawDetectionResponse};

use crate::error::AppResult;

pub use detection::PestDetectionClient;
pub use storage::StorageClient;
pub use weather::WeatherClient;

/// Blob storage for uploaded scans
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write an object under `key`. Existing keys are never overwritten.
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()>;

    async fn download(&self, key: &str) -> AppResult<Vec<u8>>;

    /// Public URL of an object
    fn public_url(&self, key: &str) -> String;
}

/// Pest detection inference endpoint
#[async_trait]
pub trait DetectionApi: Send + Sync {
    async fn detect(&self, bytes: Vec<u8>, media: MediaFile) -> AppResult<RawDetectionResponse>;
}

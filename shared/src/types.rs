//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// GPS coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsCoordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Kind of media submitted for a scan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    #[default]
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    /// Parse the `type` field reported by the detection service.
    /// Anything other than `video` is treated as an image.
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("video") {
            MediaType::Video
        } else {
            MediaType::Image
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page size limits for list queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Limit(pub i64);

impl Limit {
    pub const MAX: i64 = 200;

    /// Clamp a requested limit into `1..=MAX`, falling back to `default`.
    pub fn clamp(requested: Option<i64>, default: i64) -> i64 {
        requested.unwrap_or(default).clamp(1, Self::MAX)
    }
}

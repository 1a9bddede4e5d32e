//! Pest analysis models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::MediaType;

/// Ordinal infestation severity derived from the number of detected pests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum InfestationLevel {
    #[default]
    None,
    Low,
    Moderate,
    High,
    Critical,
}

impl InfestationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfestationLevel::None => "none",
            InfestationLevel::Low => "low",
            InfestationLevel::Moderate => "moderate",
            InfestationLevel::High => "high",
            InfestationLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for InfestationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InfestationLevel {
    type Err = String;

    /// Case-insensitive; rows written by older clients used `medium`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(InfestationLevel::None),
            "low" => Ok(InfestationLevel::Low),
            "moderate" | "medium" => Ok(InfestationLevel::Moderate),
            "high" => Ok(InfestationLevel::High),
            "critical" => Ok(InfestationLevel::Critical),
            other => Err(format!("unknown infestation level: {}", other)),
        }
    }
}

/// How the media for a scan was captured
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    #[default]
    SpotCheck,
    DroneFlight,
    LiveScan,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::SpotCheck => "spot_check",
            ScanType::DroneFlight => "drone_flight",
            ScanType::LiveScan => "live_scan",
        }
    }
}

impl std::fmt::Display for ScanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spot_check" => Ok(ScanType::SpotCheck),
            "drone_flight" => Ok(ScanType::DroneFlight),
            "live_scan" => Ok(ScanType::LiveScan),
            other => Err(format!("unknown scan type: {}", other)),
        }
    }
}

/// Projection of the latest analysis report consumed by the advisory engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PestReport {
    pub infestation_level: InfestationLevel,
    pub confidence_score: f64,
    pub analyzed_at: DateTime<Utc>,
}

impl PestReport {
    /// Confidence as a percentage. Detection scores arrive as fractions,
    /// older rows stored percentages.
    pub fn confidence_percent(&self) -> f64 {
        if self.confidence_score <= 1.0 {
            self.confidence_score * 100.0
        } else {
            self.confidence_score
        }
    }
}

/// Persisted result of one detection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub scan_type: ScanType,
    pub media_type: MediaType,
    pub image_url: String,
    pub analyzed_media: Option<String>,
    pub infestation_level: InfestationLevel,
    pub confidence_score: f64,
    pub pest_types: Vec<String>,
    /// Raw detection objects as returned by the detection service
    pub bounding_boxes: serde_json::Value,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn as_pest_report(&self) -> PestReport {
        PestReport {
            infestation_level: self.infestation_level,
            confidence_score: self.confidence_score,
            analyzed_at: self.analyzed_at,
        }
    }
}

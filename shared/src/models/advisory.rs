//! Advisory recommendation models

use serde::{Deserialize, Serialize};

/// Tri-level urgency attached to a recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Info,
    Warning,
    Critical,
}

impl Urgency {
    /// Counts towards the navigation badge
    pub fn is_urgent(&self) -> bool {
        matches!(self, Urgency::Warning | Urgency::Critical)
    }
}

/// Domain concern a recommendation addresses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    Irrigation,
    Climate,
    Disease,
    Weather,
    Pest,
    Market,
}

/// A derived, non-persisted suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub title: String,
    pub message: String,
    pub urgency: Urgency,
}

impl Recommendation {
    pub fn new(
        category: RecommendationCategory,
        urgency: Urgency,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            title: title.into(),
            message: message.into(),
            urgency,
        }
    }
}

//! Farm alert models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pest::InfestationLevel;

/// Alert severity shown in the alert list
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }

    /// Severity of the alert raised for an analysis report, if any.
    ///
    /// Only the two upper tiers raise an alert: critical infestations map to
    /// critical alerts and high infestations to high alerts. A legacy
    /// `medium` label reads as `Moderate` and raises nothing. The tier
    /// choice is recorded under "Alert severity mapping" in DESIGN.md.
    pub fn for_infestation(level: InfestationLevel) -> Option<Self> {
        match level {
            InfestationLevel::Critical => Some(AlertSeverity::Critical),
            InfestationLevel::High => Some(AlertSeverity::High),
            InfestationLevel::Moderate | InfestationLevel::Low | InfestationLevel::None => None,
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(AlertSeverity::Low),
            "medium" => Ok(AlertSeverity::Medium),
            "high" => Ok(AlertSeverity::High),
            "critical" => Ok(AlertSeverity::Critical),
            other => Err(format!("unknown alert severity: {}", other)),
        }
    }
}

/// A stored alert; only `is_read` changes after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub alert_type: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Alert about to be written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub farm_id: Uuid,
    pub alert_type: String,
    pub severity: AlertSeverity,
    pub message: String,
}

pub const PEST_DETECTION_ALERT: &str = "Pest Detection Alert";

impl NewAlert {
    /// Build the alert for a freshly persisted analysis, if its level warrants one
    pub fn for_analysis(
        farm_id: Uuid,
        level: InfestationLevel,
        pest_types: &[String],
        confidence_score: f64,
    ) -> Option<Self> {
        let severity = AlertSeverity::for_infestation(level)?;
        let pests = if pest_types.is_empty() {
            "pests".to_string()
        } else {
            pest_types.join(", ")
        };

        Some(Self {
            farm_id,
            alert_type: PEST_DETECTION_ALERT.to_string(),
            severity,
            message: format!(
                "{} {} infestation detected ({:.0}% confidence). Immediate intervention recommended.",
                capitalize(level.as_str()),
                pests,
                confidence_score * 100.0
            ),
        })
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

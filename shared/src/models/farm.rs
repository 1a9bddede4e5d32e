//! Farm and user role models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role chosen at sign-up; drives which parts of the API a user may reach
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Farmer,
    Agronomist,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Farmer => "farmer",
            UserRole::Agronomist => "agronomist",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "farmer" => Ok(UserRole::Farmer),
            "agronomist" => Ok(UserRole::Agronomist),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A farm owned by a single farmer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Farm {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub farm_name: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Farm {
    /// Name given to a farm created implicitly on first access
    pub const DEFAULT_NAME: &'static str = "My Farm";
    pub const DEFAULT_LOCATION: &'static str = "Default Location";
}

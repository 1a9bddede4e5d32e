//! Community market price models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Crops offered in the price submission form
pub const TRACKED_CROPS: &[&str] = &[
    "Maize",
    "Rice (Local)",
    "Cassava",
    "Yam",
    "Sorghum",
    "Millet",
    "Cowpea (Beans)",
    "Groundnut",
];

/// A community-contributed price observation. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSubmission {
    pub id: Uuid,
    pub crop_name: String,
    /// Price in Naira per kilogram
    pub price_per_kg: Decimal,
    pub submitted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One point of a daily price trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    /// Daily mean rounded to two decimal places
    pub average_price: Decimal,
    pub submissions: u32,
}

/// Daily trend for one crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropTrend {
    pub crop_name: String,
    pub points: Vec<PricePoint>,
}

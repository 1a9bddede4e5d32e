//! WebAssembly module for CropGuard
//!
//! Runs the advisory engine and detection helpers in the browser so the
//! advisory badge and upload form work without a round trip.

use serde::Deserialize;
use shared::{
    AdvisoryStatus, AdvisoryThresholds, MarketSubmission, PestReport, Recommendation,
    SensorReading, WeatherSnapshot,
};
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;

/// Farm state posted from the page. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AdvisoryRequest {
    sensor: Option<SensorReading>,
    weather: Option<WeatherSnapshot>,
    pest: Option<PestReport>,
    market: Vec<MarketSubmission>,
    thresholds: Option<AdvisoryThresholds>,
}

impl AdvisoryRequest {
    fn parse(input_json: &str) -> Result<Self, String> {
        serde_json::from_str(input_json).map_err(|e| format!("Invalid advisory input: {}", e))
    }

    fn recommendations(&self) -> Vec<Recommendation> {
        let thresholds = self.thresholds.clone().unwrap_or_default();
        shared::generate_recommendations(
            self.sensor.as_ref(),
            self.weather.as_ref(),
            self.pest.as_ref(),
            &self.market,
            &thresholds,
        )
    }
}

fn recommendations_for(input_json: &str) -> Result<String, String> {
    let recommendations = AdvisoryRequest::parse(input_json)?.recommendations();
    serde_json::to_string(&recommendations).map_err(|e| e.to_string())
}

fn status_for(input_json: &str) -> Result<String, String> {
    let recommendations = AdvisoryRequest::parse(input_json)?.recommendations();
    serde_json::to_string(&AdvisoryStatus::from_recommendations(&recommendations))
        .map_err(|e| e.to_string())
}

fn to_js_error(message: String) -> JsValue {
    web_sys::console::warn_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

/// Recommendations in rule order as a JSON array
#[wasm_bindgen]
pub fn generate_recommendations_json(input_json: &str) -> Result<String, JsValue> {
    recommendations_for(input_json).map_err(to_js_error)
}

/// `{ urgent_count, has_urgent }` for the navigation badge
#[wasm_bindgen]
pub fn advisory_status_json(input_json: &str) -> Result<String, JsValue> {
    status_for(input_json).map_err(to_js_error)
}

/// Infestation level label for a detected pest count
#[wasm_bindgen]
pub fn classify_infestation(count: u32) -> String {
    shared::classify_detection_count(count).to_string()
}

/// MIME type the server will use for an upload with this name
#[wasm_bindgen]
pub fn mime_type_for_path(path: &str) -> String {
    shared::mime_type_for_path(path).mime_type.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input_yields_no_recommendations() {
        assert_eq!(recommendations_for("{}").unwrap(), "[]");
        let status: serde_json::Value = serde_json::from_str(&status_for("{}").unwrap()).unwrap();
        assert_eq!(status, json!({ "urgent_count": 0, "has_urgent": false }));
    }

    #[test]
    fn test_critical_pest_report_is_urgent() {
        let input = json!({
            "pest": {
                "infestation_level": "critical",
                "confidence_score": 0.9,
                "analyzed_at": "2024-06-01T08:00:00Z"
            }
        })
        .to_string();

        let recommendations: Vec<Recommendation> =
            serde_json::from_str(&recommendations_for(&input).unwrap()).unwrap();
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].urgency, Urgency::Critical);

        let status: AdvisoryStatus = serde_json::from_str(&status_for(&input).unwrap()).unwrap();
        assert!(status.has_urgent);
        assert_eq!(status.urgent_count, 1);
    }

    #[test]
    fn test_threshold_override() {
        let input = json!({
            "sensor": { "soil_moisture": 35.0 },
            "thresholds": { "soil_moisture_low": 40.0 }
        })
        .to_string();

        let recommendations: Vec<Recommendation> =
            serde_json::from_str(&recommendations_for(&input).unwrap()).unwrap();
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].category, RecommendationCategory::Irrigation);
    }

    #[test]
    fn test_malformed_input_is_reported() {
        let err = recommendations_for("{\"market\": 3}").unwrap_err();
        assert!(err.starts_with("Invalid advisory input"));
    }

    #[test]
    fn test_classify_infestation() {
        assert_eq!(classify_infestation(0), "none");
        assert_eq!(classify_infestation(1), "low");
        assert_eq!(classify_infestation(4), "moderate");
        assert_eq!(classify_infestation(9), "high");
        assert_eq!(classify_infestation(10), "critical");
    }

    #[test]
    fn test_mime_type_for_path() {
        assert_eq!(mime_type_for_path("clip.MOV"), "video/quicktime");
        assert_eq!(mime_type_for_path("leaf.webp"), "image/webp");
        assert_eq!(mime_type_for_path("leaf"), "image/jpeg");
    }
}

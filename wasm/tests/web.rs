//! Browser tests for the exported bindings
//!
//! Run with `wasm-pack test --headless --firefox wasm`.

#![cfg(target_arch = "wasm32")]

use cropguard_wasm::{
    advisory_status_json, classify_infestation, generate_recommendations_json,
    mime_type_for_path,
};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_recommendations_for_dry_hot_field() {
    let input = r#"{"sensor": {"soil_moisture": 22.0, "temperature": 36.5}}"#;
    let output = generate_recommendations_json(input).unwrap();
    let recommendations: serde_json::Value = serde_json::from_str(&output).unwrap();

    let items = recommendations.as_array().unwrap();
    assert!(!items.is_empty());
    assert_eq!(items[0]["category"], "irrigation");
}

#[wasm_bindgen_test]
fn test_status_badge_for_critical_scan() {
    let input = r#"{
        "pest": {
            "infestation_level": "critical",
            "confidence_score": 0.9,
            "analyzed_at": "2024-06-01T08:00:00Z"
        }
    }"#;
    let status: serde_json::Value =
        serde_json::from_str(&advisory_status_json(input).unwrap()).unwrap();
    assert_eq!(status["has_urgent"], true);
    assert_eq!(status["urgent_count"], 1);
}

#[wasm_bindgen_test]
fn test_malformed_input_becomes_js_error() {
    let err = generate_recommendations_json("not json").unwrap_err();
    let message = err.as_string().unwrap();
    assert!(message.starts_with("Invalid advisory input"));
}

#[wasm_bindgen_test]
fn test_detection_helpers() {
    assert_eq!(classify_infestation(10), "critical");
    assert_eq!(classify_infestation(1), "low");
    assert_eq!(mime_type_for_path("capture.webm"), "video/webm");
    assert_eq!(mime_type_for_path("leaf"), "image/jpeg");
}

//! Validation utilities for the CropGuard platform

use rust_decimal::Decimal;

use crate::detection::file_extension;
use crate::models::TRACKED_CROPS;

// ============================================================================
// Market Validations
// ============================================================================

/// Validate a submitted price per kilogram
pub fn validate_price(price_per_kg: Decimal) -> Result<(), &'static str> {
    if price_per_kg <= Decimal::ZERO {
        return Err("Price must be greater than zero");
    }
    if price_per_kg > Decimal::from(10_000_000) {
        return Err("Price is unrealistically high");
    }
    Ok(())
}

/// Validate the crop name of a price submission
pub fn validate_crop_name(crop_name: &str) -> Result<(), &'static str> {
    if crop_name.trim().is_empty() {
        return Err("Crop name is required");
    }
    if !is_tracked_crop(crop_name) {
        return Err("Crop is not tracked by the market board");
    }
    Ok(())
}

/// Whether prices for this crop are collected
pub fn is_tracked_crop(crop_name: &str) -> bool {
    TRACKED_CROPS.iter().any(|c| *c == crop_name)
}

// ============================================================================
// Sensor Validations
// ============================================================================

/// Validate the physical ranges of a device payload.
/// Absent measurements are accepted.
pub fn validate_sensor_ranges(
    temperature: Option<f64>,
    humidity: Option<f64>,
    soil_moisture: Option<f64>,
    light_intensity: Option<f64>,
) -> Result<(), &'static str> {
    if let Some(t) = temperature {
        if !t.is_finite() || !(-50.0..=70.0).contains(&t) {
            return Err("Temperature must be between -50 and 70 °C");
        }
    }
    if let Some(h) = humidity {
        if !h.is_finite() || !(0.0..=100.0).contains(&h) {
            return Err("Humidity must be between 0 and 100%");
        }
    }
    if let Some(m) = soil_moisture {
        if !m.is_finite() || !(0.0..=100.0).contains(&m) {
            return Err("Soil moisture must be between 0 and 100%");
        }
    }
    if let Some(l) = light_intensity {
        if !l.is_finite() || l < 0.0 {
            return Err("Light intensity cannot be negative");
        }
    }
    Ok(())
}

// ============================================================================
// Upload Validations
// ============================================================================

/// File extensions accepted by the scan upload
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "mp4", "avi", "mov", "webm"];

/// Validate an uploaded file name and return its lower-cased extension
pub fn validate_upload_file_name(file_name: &str) -> Result<String, &'static str> {
    let ext = file_extension(file_name).ok_or("File must have an extension")?;
    if !ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err("Unsupported file type; upload an image or a video");
    }
    Ok(ext)
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && email.len() >= 5 => {
            Ok(())
        }
        _ => Err("Invalid email format"),
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 6 {
        return Err("Password must be at least 6 characters");
    }
    Ok(())
}

//! Farm advisory engine
//!
//! Maps the latest known farm state to an ordered list of recommendations.
//! The engine is a pure function: no I/O, no clock, no randomness. Rules run in
//! a fixed order (sensor, weather, pest, market) and each emits at most one
//! recommendation. Sorting by urgency is left to callers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::market::price_movements;
use crate::models::{
    InfestationLevel, MarketSubmission, PestReport, Recommendation, RecommendationCategory,
    SensorReading, Urgency, WeatherCondition, WeatherSnapshot,
};

/// Rule thresholds. Configuration constants, never derived from data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryThresholds {
    /// Soil moisture (%) below which irrigation is advised
    pub soil_moisture_low: f64,
    /// Soil moisture (%) above which waterlogging is flagged
    pub soil_moisture_high: f64,
    /// Air temperature (°C) above which heat stress is flagged
    pub temperature_high: f64,
    /// Air temperature (°C) below which cold stress is flagged
    pub temperature_low: f64,
    /// Relative humidity (%) above which fungal risk is flagged
    pub humidity_high: f64,
    /// Light intensity (lux) below which low light is flagged
    pub light_low: f64,
    /// Forecast daily maximum (°C) that counts as a heat wave
    pub forecast_heat: f64,
    /// Percentage fall of the latest price against the crop's earlier mean
    pub market_drop_percent: f64,
    /// Percentage rise of the latest price against the crop's earlier mean
    pub market_rise_percent: f64,
}

impl Default for AdvisoryThresholds {
    fn default() -> Self {
        Self {
            soil_moisture_low: 30.0,
            soil_moisture_high: 80.0,
            temperature_high: 35.0,
            temperature_low: 12.0,
            humidity_high: 80.0,
            light_low: 1000.0,
            forecast_heat: 38.0,
            market_drop_percent: 10.0,
            market_rise_percent: 10.0,
        }
    }
}

/// Generate recommendations for one farm.
///
/// Missing inputs skip the rules that depend on them; an all-empty input
/// yields an empty list.
pub fn generate_recommendations(
    sensor: Option<&SensorReading>,
    weather: Option<&WeatherSnapshot>,
    pest: Option<&PestReport>,
    market: &[MarketSubmission],
    thresholds: &AdvisoryThresholds,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if let Some(reading) = sensor {
        out.extend(soil_moisture_low(reading, thresholds));
        out.extend(soil_moisture_high(reading, thresholds));
        out.extend(temperature_high(reading, thresholds));
        out.extend(temperature_low(reading, thresholds));
        out.extend(fungal_risk(reading, thresholds));
        out.extend(low_light(reading, thresholds));
    }

    if let Some(snapshot) = weather {
        out.extend(severe_weather(snapshot));
        out.extend(rain_expected(snapshot));
        out.extend(heat_wave(snapshot, thresholds));
    }

    if let Some(report) = pest {
        out.extend(pest_pressure(report));
    }

    if !market.is_empty() {
        out.extend(market_drop(market, thresholds));
        out.extend(market_rise(market, thresholds));
    }

    out
}

/// Stable sort, most urgent first. Ties keep generation order.
pub fn sort_by_urgency(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| b.urgency.cmp(&a.urgency));
}

/// Badge state derived from a recommendation list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryStatus {
    pub urgent_count: usize,
    pub has_urgent: bool,
}

impl AdvisoryStatus {
    pub fn from_recommendations(recommendations: &[Recommendation]) -> Self {
        let urgent_count = recommendations
            .iter()
            .filter(|r| r.urgency.is_urgent())
            .count();
        Self {
            urgent_count,
            has_urgent: urgent_count > 0,
        }
    }
}

// ============================================================================
// Sensor rules
// ============================================================================

fn soil_moisture_low(reading: &SensorReading, t: &AdvisoryThresholds) -> Option<Recommendation> {
    let moisture = reading.soil_moisture?;
    (moisture < t.soil_moisture_low).then(|| {
        Recommendation::new(
            RecommendationCategory::Irrigation,
            Urgency::Warning,
            "Irrigation needed",
            format!(
                "Soil moisture is at {:.1}%, below the {:.0}% threshold. Irrigate within the next 24 hours.",
                moisture, t.soil_moisture_low
            ),
        )
    })
}

fn soil_moisture_high(reading: &SensorReading, t: &AdvisoryThresholds) -> Option<Recommendation> {
    let moisture = reading.soil_moisture?;
    (moisture > t.soil_moisture_high).then(|| {
        Recommendation::new(
            RecommendationCategory::Irrigation,
            Urgency::Info,
            "Soil is waterlogged",
            format!(
                "Soil moisture is at {:.1}%. Pause irrigation and check field drainage.",
                moisture
            ),
        )
    })
}

fn temperature_high(reading: &SensorReading, t: &AdvisoryThresholds) -> Option<Recommendation> {
    let temperature = reading.temperature?;
    (temperature > t.temperature_high).then(|| {
        Recommendation::new(
            RecommendationCategory::Climate,
            Urgency::Warning,
            "Heat stress risk",
            format!(
                "Field temperature is {:.1}°C. Irrigate early in the morning and monitor crops for wilting.",
                temperature
            ),
        )
    })
}

fn temperature_low(reading: &SensorReading, t: &AdvisoryThresholds) -> Option<Recommendation> {
    let temperature = reading.temperature?;
    (temperature < t.temperature_low).then(|| {
        Recommendation::new(
            RecommendationCategory::Climate,
            Urgency::Warning,
            "Cold stress risk",
            format!(
                "Field temperature is {:.1}°C. Protect seedlings and delay transplanting.",
                temperature
            ),
        )
    })
}

fn fungal_risk(reading: &SensorReading, t: &AdvisoryThresholds) -> Option<Recommendation> {
    let humidity = reading.humidity?;
    (humidity > t.humidity_high).then(|| {
        Recommendation::new(
            RecommendationCategory::Disease,
            Urgency::Warning,
            "Fungal disease risk",
            format!(
                "Humidity is at {:.0}%. Improve ventilation and inspect leaves for fungal growth.",
                humidity
            ),
        )
    })
}

fn low_light(reading: &SensorReading, t: &AdvisoryThresholds) -> Option<Recommendation> {
    let light = reading.light_intensity?;
    (light < t.light_low).then(|| {
        Recommendation::new(
            RecommendationCategory::Climate,
            Urgency::Info,
            "Low light levels",
            format!(
                "Light intensity is {:.0} lux. Check for shading or a dirty sensor.",
                light
            ),
        )
    })
}

// ============================================================================
// Weather rules
// ============================================================================

fn severe_weather(snapshot: &WeatherSnapshot) -> Option<Recommendation> {
    let now = WeatherCondition::from_code(snapshot.weather_code).is_severe();
    let soon = snapshot
        .daily_weather_codes
        .iter()
        .any(|code| WeatherCondition::from_code(*code).is_severe());

    (now || soon).then(|| {
        let when = if now { "now" } else { "in the coming days" };
        Recommendation::new(
            RecommendationCategory::Weather,
            Urgency::Critical,
            "Thunderstorm warning",
            format!(
                "Thunderstorms are expected {}. Secure equipment, postpone spraying and ensure drainage.",
                when
            ),
        )
    })
}

fn rain_expected(snapshot: &WeatherSnapshot) -> Option<Recommendation> {
    let rainy_days = snapshot
        .daily_weather_codes
        .iter()
        .filter(|code| WeatherCondition::from_code(**code).is_wet())
        .count();

    (rainy_days > 0).then(|| {
        Recommendation::new(
            RecommendationCategory::Weather,
            Urgency::Info,
            "Rain in the forecast",
            format!(
                "Rain is forecast on {} of the next {} days. Reduce irrigation and avoid spraying before rainfall.",
                rainy_days,
                snapshot.daily_weather_codes.len()
            ),
        )
    })
}

fn heat_wave(snapshot: &WeatherSnapshot, t: &AdvisoryThresholds) -> Option<Recommendation> {
    let peak = snapshot
        .daily_max
        .iter()
        .copied()
        .fold(None, |acc: Option<f64>, v| match acc {
            Some(max) if max >= v => Some(max),
            _ => Some(v),
        })?;

    (peak > t.forecast_heat).then(|| {
        Recommendation::new(
            RecommendationCategory::Weather,
            Urgency::Warning,
            "Heat wave ahead",
            format!(
                "Daily highs of up to {:.0}°C are forecast. Plan irrigation and mulch to retain soil moisture.",
                peak
            ),
        )
    })
}

// ============================================================================
// Pest rule
// ============================================================================

fn pest_pressure(report: &PestReport) -> Option<Recommendation> {
    let confidence = report.confidence_percent();
    let (urgency, title, action) = match report.infestation_level {
        InfestationLevel::Critical | InfestationLevel::High => (
            Urgency::Critical,
            "Severe pest infestation",
            "Apply targeted treatment immediately and contact an agronomist.",
        ),
        InfestationLevel::Moderate => (
            Urgency::Warning,
            "Moderate pest activity",
            "Scout the field and consider early treatment to prevent spread.",
        ),
        InfestationLevel::Low => (
            Urgency::Info,
            "Low pest activity",
            "Keep monitoring with regular spot checks.",
        ),
        InfestationLevel::None => return None,
    };

    Some(Recommendation::new(
        RecommendationCategory::Pest,
        urgency,
        title,
        format!(
            "Latest scan shows a {} infestation ({:.0}% confidence). {}",
            report.infestation_level, confidence, action
        ),
    ))
}

// ============================================================================
// Market rules
// ============================================================================

fn market_drop(market: &[MarketSubmission], t: &AdvisoryThresholds) -> Option<Recommendation> {
    let limit = -percent(t.market_drop_percent);
    let worst = price_movements(market)
        .into_iter()
        .filter(|m| m.change_percent < limit)
        .fold(None, |acc: Option<crate::market::PriceMovement>, m| match acc {
            Some(best) if best.change_percent <= m.change_percent => Some(best),
            _ => Some(m),
        })?;

    Some(Recommendation::new(
        RecommendationCategory::Market,
        Urgency::Info,
        format!("{} prices falling", worst.crop_name),
        format!(
            "{} is trading at ₦{}/kg, {}% below its recent average of ₦{}/kg. Consider storing produce until prices recover.",
            worst.crop_name,
            worst.latest_price.round_dp(2),
            worst.change_percent.abs().round_dp(1),
            worst.baseline_price.round_dp(2)
        ),
    ))
}

fn market_rise(market: &[MarketSubmission], t: &AdvisoryThresholds) -> Option<Recommendation> {
    let limit = percent(t.market_rise_percent);
    let best = price_movements(market)
        .into_iter()
        .filter(|m| m.change_percent > limit)
        .fold(None, |acc: Option<crate::market::PriceMovement>, m| match acc {
            Some(best) if best.change_percent >= m.change_percent => Some(best),
            _ => Some(m),
        })?;

    Some(Recommendation::new(
        RecommendationCategory::Market,
        Urgency::Info,
        format!("{} prices rising", best.crop_name),
        format!(
            "{} is trading at ₦{}/kg, {}% above its recent average of ₦{}/kg. A good time to sell.",
            best.crop_name,
            best.latest_price.round_dp(2),
            best.change_percent.round_dp(1),
            best.baseline_price.round_dp(2)
        ),
    ))
}

fn percent(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or_default()
}

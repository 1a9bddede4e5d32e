//! Advisory service
//!
//! Gathers the latest farm state and runs the shared advisory engine over it.

use serde::Serialize;
use shared::{
    generate_recommendations, sort_by_urgency, AdvisoryStatus, AdvisoryThresholds,
    Recommendation,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppResult;
use crate::services::{MarketService, ReportService, SensorService, WeatherService};

#[derive(Clone)]
pub struct AdvisoryService {
    sensors: SensorService,
    reports: ReportService,
    market: MarketService,
    weather: WeatherService,
    thresholds: AdvisoryThresholds,
}

/// Recommendations for a farm, most urgent first
#[derive(Debug, Serialize)]
pub struct Advisory {
    pub recommendations: Vec<Recommendation>,
    pub status: AdvisoryStatus,
}

impl AdvisoryService {
    pub fn new(db: PgPool, weather: WeatherService, config: &Config) -> Self {
        Self {
            sensors: SensorService::new(db.clone()),
            reports: ReportService::new(db.clone()),
            market: MarketService::new(db, &config.market),
            weather,
            thresholds: config.advisory.clone(),
        }
    }

    /// Recommendations in rule order
    pub async fn recommendations(&self, farm_id: Uuid) -> AppResult<Vec<Recommendation>> {
        let sensor = self.sensors.latest(farm_id).await?;
        let pest = self
            .reports
            .latest(farm_id)
            .await?
            .map(|report| report.as_pest_report());
        let market = self.market.recent_sample().await?;
        let weather = self.weather.current_or_none().await;

        let recommendations = generate_recommendations(
            sensor.as_ref().map(|s| &s.reading),
            weather.as_ref(),
            pest.as_ref(),
            &market,
            &self.thresholds,
        );

        tracing::debug!(%farm_id, count = recommendations.len(), "Generated recommendations");
        Ok(recommendations)
    }

    pub async fn advisory(&self, farm_id: Uuid) -> AppResult<Advisory> {
        let mut recommendations = self.recommendations(farm_id).await?;
        let status = AdvisoryStatus::from_recommendations(&recommendations);
        sort_by_urgency(&mut recommendations);

        Ok(Advisory {
            recommendations,
            status,
        })
    }

    pub async fn status(&self, farm_id: Uuid) -> AppResult<AdvisoryStatus> {
        let recommendations = self.recommendations(farm_id).await?;
        Ok(AdvisoryStatus::from_recommendations(&recommendations))
    }
}

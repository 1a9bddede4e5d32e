//! Weather service
//!
//! Snapshots are fetched on demand for the configured farm coordinates and
//! never stored.

use shared::{GpsCoordinates, WeatherSnapshot};

use crate::config::WeatherConfig;
use crate::error::AppResult;
use crate::external::WeatherClient;

#[derive(Clone)]
pub struct WeatherService {
    client: WeatherClient,
    location: GpsCoordinates,
}

impl WeatherService {
    pub fn new(client: WeatherClient, config: &WeatherConfig) -> Self {
        Self {
            client,
            location: GpsCoordinates::new(config.latitude, config.longitude),
        }
    }

    pub async fn current(&self) -> AppResult<WeatherSnapshot> {
        self.client.get_snapshot(self.location).await
    }

    /// Like [`current`](Self::current) but a provider outage yields `None`
    pub async fn current_or_none(&self) -> Option<WeatherSnapshot> {
        match self.current().await {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(error = %err, "Weather unavailable, skipping weather rules");
                None
            }
        }
    }
}

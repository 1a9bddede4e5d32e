//! Realtime sensor feed
//!
//! Ingested readings are fanned out over a broadcast channel. Each
//! subscriber only sees readings for the farm it subscribed to.

use shared::SensorRecord;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct SensorFeed {
    tx: broadcast::Sender<SensorRecord>,
}

impl Default for SensorFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SensorFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a stored reading. Returns the number of live receivers.
    pub fn publish(&self, record: SensorRecord) -> usize {
        self.tx.send(record).unwrap_or(0)
    }

    pub fn subscribe(&self, farm_id: Uuid) -> SensorSubscription {
        tracing::debug!(%farm_id, "Sensor feed subscription opened");
        SensorSubscription {
            farm_id,
            rx: Some(self.tx.subscribe()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Handle to a farm's reading stream. Dropping it also unsubscribes.
pub struct SensorSubscription {
    farm_id: Uuid,
    rx: Option<broadcast::Receiver<SensorRecord>>,
}

impl SensorSubscription {
    /// Next reading for this farm, or `None` once unsubscribed or the feed
    /// is gone. Readings lost to lag are skipped.
    pub async fn recv(&mut self) -> Option<SensorRecord> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(record) if record.farm_id == self.farm_id => return Some(record),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(farm_id = %self.farm_id, skipped, "Sensor subscriber lagged");
                }
                Err(RecvError::Closed) => {
                    self.rx = None;
                    return None;
                }
            }
        }
    }

    pub fn unsubscribe(&mut self) {
        if self.rx.take().is_some() {
            tracing::debug!(farm_id = %self.farm_id, "Sensor feed subscription closed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::SensorReading;

    fn record(farm_id: Uuid, temperature: f64) -> SensorRecord {
        SensorRecord {
            id: Uuid::new_v4(),
            farm_id,
            reading: SensorReading {
                temperature: Some(temperature),
                ..Default::default()
            },
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_subscription_filters_by_farm() {
        let feed = SensorFeed::new(16);
        let farm = Uuid::new_v4();
        let mut sub = feed.subscribe(farm);

        feed.publish(record(Uuid::new_v4(), 10.0));
        feed.publish(record(farm, 27.5));

        let received = sub.recv().await.unwrap();
        assert_eq!(received.farm_id, farm);
        assert_eq!(received.reading.temperature, Some(27.5));
    }

    #[tokio::test]
    async fn test_unsubscribe_releases_receiver() {
        let feed = SensorFeed::new(16);
        let farm = Uuid::new_v4();
        let mut sub = feed.subscribe(farm);
        assert_eq!(feed.subscriber_count(), 1);

        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(feed.subscriber_count(), 0);
        assert!(sub.recv().await.is_none());
        assert_eq!(feed.publish(record(farm, 20.0)), 0);
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let feed = SensorFeed::default();
        {
            let _sub = feed.subscribe(Uuid::new_v4());
            assert_eq!(feed.subscriber_count(), 1);
        }
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_keeps_receiving() {
        let feed = SensorFeed::new(2);
        let farm = Uuid::new_v4();
        let mut sub = feed.subscribe(farm);

        for i in 0..5 {
            feed.publish(record(farm, i as f64));
        }

        let received = sub.recv().await.unwrap();
        assert_eq!(received.reading.temperature, Some(3.0));
        assert!(sub.is_active());
    }
}

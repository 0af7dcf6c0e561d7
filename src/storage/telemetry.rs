//! Sled-backed telemetry time series
//!
//! Readings are keyed by `[sensor_id BE bytes][timestamp_millis BE bytes]`
//! so a sled range scan yields one sensor's readings in chronological order.

use super::{StorageError, TelemetryStore};
use crate::types::Reading;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Composite key: sensor id then millisecond timestamp, both big-endian.
fn reading_key(sensor_id: u64, timestamp_millis: i64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&sensor_id.to_be_bytes());
    // Negative pre-epoch timestamps would break BE ordering; telemetry is
    // always post-epoch so clamp instead of encoding sign.
    key[8..].copy_from_slice(&(timestamp_millis.max(0) as u64).to_be_bytes());
    key
}

/// Sled-backed [`TelemetryStore`].
#[derive(Clone)]
pub struct SledTelemetryStore {
    db: Arc<sled::Db>,
}

impl SledTelemetryStore {
    /// Open or create the telemetry store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Number of stored readings (all sensors). Primarily for diagnostics.
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}

#[async_trait]
impl TelemetryStore for SledTelemetryStore {
    /// Note: does not flush on each write. Sled provides durability via
    /// background flushing; on crash the last few readings may be lost, which
    /// is acceptable because the next sensor sample re-establishes the window.
    async fn append(&self, reading: &Reading) -> Result<(), StorageError> {
        let key = reading_key(reading.sensor_id, reading.timestamp.timestamp_millis());
        let value = serde_json::to_vec(reading)?;
        self.db.insert(key, value)?;
        Ok(())
    }

    async fn readings_since(
        &self,
        sensor_id: u64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StorageError> {
        let start = reading_key(sensor_id, since.timestamp_millis());
        let end = reading_key(sensor_id, i64::MAX);

        let mut readings = Vec::new();
        for item in self.db.range(start..=end) {
            let (_key, value) = item?;
            match serde_json::from_slice::<Reading>(&value) {
                Ok(reading) => readings.push(reading),
                Err(e) => {
                    // A corrupt row shouldn't sink the whole window query
                    tracing::warn!(sensor_id, error = %e, "Skipping undecodable reading");
                }
            }
        }
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reading(sensor_id: u64, ts: DateTime<Utc>, flow: f64) -> Reading {
        Reading {
            sensor_id,
            timestamp: ts,
            flow_rate: Some(flow),
            pressure: Some(45.0),
            battery_level: 90,
        }
    }

    #[tokio::test]
    async fn test_range_query_is_per_sensor_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledTelemetryStore::open(dir.path()).unwrap();
        let now = Utc::now();

        // Interleave two sensors, insert out of order
        store.append(&reading(1, now - Duration::hours(1), 2.0)).await.unwrap();
        store.append(&reading(2, now - Duration::hours(2), 9.0)).await.unwrap();
        store.append(&reading(1, now - Duration::hours(3), 1.0)).await.unwrap();
        store.append(&reading(1, now - Duration::hours(2), 1.5)).await.unwrap();

        let window = store
            .readings_since(1, now - Duration::hours(26))
            .await
            .unwrap();

        assert_eq!(window.len(), 3);
        assert!(window.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(window.iter().all(|r| r.sensor_id == 1));
    }

    #[tokio::test]
    async fn test_since_bound_excludes_older_readings() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledTelemetryStore::open(dir.path()).unwrap();
        let now = Utc::now();

        store.append(&reading(5, now - Duration::days(40), 3.0)).await.unwrap();
        store.append(&reading(5, now - Duration::days(2), 3.0)).await.unwrap();

        let window = store
            .readings_since(5, now - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(window.len(), 1);
    }
}

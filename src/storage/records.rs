//! Sled-backed leak and alert record store
//!
//! Two trees in one database: `leaks` and `alerts`, both keyed by the
//! monotonic id sled assigns at insert time (big-endian, so iteration is
//! chronological by creation).

use super::{RecordStore, StorageError};
use crate::types::{Alert, LeakDetection};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Sled-backed [`RecordStore`].
#[derive(Clone)]
pub struct SledRecordStore {
    db: Arc<sled::Db>,
    leaks: sled::Tree,
    alerts: sled::Tree,
}

impl SledRecordStore {
    /// Open or create the record store at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        let leaks = db.open_tree("leaks")?;
        let alerts = db.open_tree("alerts")?;
        Ok(Self {
            db: Arc::new(db),
            leaks,
            alerts,
        })
    }

    /// The most recent alerts, newest first. For operator display.
    pub fn recent_alerts(&self, limit: usize) -> Vec<Alert> {
        self.alerts
            .iter()
            .rev()
            .filter_map(|item| item.ok())
            .filter_map(|(_k, v)| serde_json::from_slice(&v).ok())
            .take(limit)
            .collect()
    }
}

#[async_trait]
impl RecordStore for SledRecordStore {
    async fn create_leak_detection(&self, leak: &LeakDetection) -> Result<u64, StorageError> {
        let id = self.db.generate_id()?;
        let mut record = leak.clone();
        record.id = id;
        self.leaks.insert(id.to_be_bytes(), serde_json::to_vec(&record)?)?;
        Ok(id)
    }

    async fn create_alert(&self, alert: &Alert) -> Result<u64, StorageError> {
        let id = self.db.generate_id()?;
        let mut record = alert.clone();
        record.id = id;
        self.alerts.insert(id.to_be_bytes(), serde_json::to_vec(&record)?)?;
        Ok(id)
    }

    /// Scans newest-id-first and stops at the first match. Leak records are
    /// rare (one per confirmed event, cooldown-suppressed), so a scan beats
    /// maintaining a per-sensor secondary index here. `detected_at` is not
    /// monotone in insertion id (late-arriving readings backdate it), so the
    /// scan must not early-exit on an old timestamp.
    async fn open_leak_since(
        &self,
        sensor_id: u64,
        since: DateTime<Utc>,
    ) -> Result<Option<LeakDetection>, StorageError> {
        for item in self.leaks.iter().rev() {
            let (_key, value) = item?;
            let leak: LeakDetection = match serde_json::from_slice(&value) {
                Ok(l) => l,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping undecodable leak record");
                    continue;
                }
            };
            if leak.sensor_id == sensor_id
                && leak.detected_at >= since
                && !leak.status.is_resolved()
            {
                return Ok(Some(leak));
            }
        }
        Ok(None)
    }
}

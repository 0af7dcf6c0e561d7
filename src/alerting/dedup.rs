//! Open-leak alert suppression
//!
//! A sustained leak keeps producing qualifying readings for hours, and each
//! one would otherwise open a fresh leak record and alert, flooding operators
//! over a single event. This policy suppresses re-detection while the sensor
//! has an unresolved leak record younger than the cooldown window.
//! Once an operator resolves the record (repaired or false alarm), or the
//! record ages past the cooldown, detection re-arms automatically.

use crate::config::AlertingConfig;
use crate::storage::{RecordStore, StorageError};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Cooldown/dedup policy for leak alerts.
pub struct OpenLeakSuppression {
    cooldown: Duration,
}

impl OpenLeakSuppression {
    pub fn new(cfg: AlertingConfig) -> Self {
        Self {
            cooldown: Duration::hours(cfg.cooldown_hours),
        }
    }

    /// Should a new detection for `sensor_id` at `now` be suppressed?
    pub async fn should_suppress(
        &self,
        records: &dyn RecordStore,
        sensor_id: u64,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        match records.open_leak_since(sensor_id, now - self.cooldown).await? {
            Some(open) => {
                debug!(
                    sensor_id,
                    open_leak_id = open.id,
                    detected_at = %open.detected_at,
                    "Suppressing duplicate detection, unresolved leak within cooldown"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

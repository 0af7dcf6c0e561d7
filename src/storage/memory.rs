//! In-memory store implementations
//!
//! Back the regression tests and the `--simulate` mode, where durability is
//! irrelevant and inspectability matters.

use super::{RecordStore, StorageError, TelemetryStore};
use crate::types::{Alert, LeakDetection, Reading};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// In-memory [`TelemetryStore`].
#[derive(Default)]
pub struct MemoryTelemetryStore {
    readings: Mutex<Vec<Reading>>,
}

impl MemoryTelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.readings.lock().expect("telemetry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TelemetryStore for MemoryTelemetryStore {
    async fn append(&self, reading: &Reading) -> Result<(), StorageError> {
        self.readings
            .lock()
            .expect("telemetry lock poisoned")
            .push(reading.clone());
        Ok(())
    }

    async fn readings_since(
        &self,
        sensor_id: u64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StorageError> {
        let mut matching: Vec<Reading> = self
            .readings
            .lock()
            .expect("telemetry lock poisoned")
            .iter()
            .filter(|r| r.sensor_id == sensor_id && r.timestamp >= since)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.timestamp);
        Ok(matching)
    }
}

/// In-memory [`RecordStore`] with accessors for test assertions.
#[derive(Default)]
pub struct MemoryRecordStore {
    leaks: Mutex<Vec<LeakDetection>>,
    alerts: Mutex<Vec<Alert>>,
    next_id: AtomicU64,
    /// When set, `create_alert` fails — used to exercise the
    /// leak-persisted-but-alert-failed partial success path.
    fail_alerts: std::sync::atomic::AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaks(&self) -> Vec<LeakDetection> {
        self.leaks.lock().expect("record lock poisoned").clone()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().expect("record lock poisoned").clone()
    }

    /// Make subsequent `create_alert` calls fail (test hook).
    pub fn fail_alert_writes(&self, fail: bool) {
        self.fail_alerts.store(fail, Ordering::SeqCst);
    }

    /// Mark a stored leak resolved, standing in for the operator workflow.
    pub fn resolve_leak(&self, leak_id: u64) {
        let mut leaks = self.leaks.lock().expect("record lock poisoned");
        if let Some(leak) = leaks.iter_mut().find(|l| l.id == leak_id) {
            leak.status = crate::types::LeakStatus::Repaired;
            leak.resolved_at = Some(Utc::now());
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create_leak_detection(&self, leak: &LeakDetection) -> Result<u64, StorageError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut record = leak.clone();
        record.id = id;
        self.leaks.lock().expect("record lock poisoned").push(record);
        Ok(id)
    }

    async fn create_alert(&self, alert: &Alert) -> Result<u64, StorageError> {
        if self.fail_alerts.load(Ordering::SeqCst) {
            return Err(StorageError::Database(sled::Error::Unsupported(
                "alert writes disabled by test hook".into(),
            )));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut record = alert.clone();
        record.id = id;
        self.alerts.lock().expect("record lock poisoned").push(record);
        Ok(id)
    }

    async fn open_leak_since(
        &self,
        sensor_id: u64,
        since: DateTime<Utc>,
    ) -> Result<Option<LeakDetection>, StorageError> {
        Ok(self
            .leaks
            .lock()
            .expect("record lock poisoned")
            .iter()
            .rev()
            .find(|l| {
                l.sensor_id == sensor_id && !l.status.is_resolved() && l.detected_at >= since
            })
            .cloned())
    }
}

//! Persistence collaborators for the detection pipeline
//!
//! The pipeline talks to two abstract stores:
//! - [`TelemetryStore`]: append-only per-sensor time series of readings,
//!   queried by trailing time window
//! - [`RecordStore`]: leak detection records and operator alerts
//!
//! Production uses the sled-backed implementations; tests and the simulator
//! use the in-memory ones. Both stores are transactionally independent — a
//! failed alert write never rolls back a persisted leak record.

mod telemetry;
mod records;
mod memory;

pub use telemetry::SledTelemetryStore;
pub use records::SledRecordStore;
pub use memory::{MemoryRecordStore, MemoryTelemetryStore};

use crate::types::{Alert, LeakDetection, Reading};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Append-only per-sensor time series of readings.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Persist one reading.
    async fn append(&self, reading: &Reading) -> Result<(), StorageError>;

    /// All readings for `sensor_id` with `timestamp >= since`, ordered by
    /// timestamp ascending.
    async fn readings_since(
        &self,
        sensor_id: u64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Reading>, StorageError>;
}

/// Leak records and alerts, as seen by the pipeline.
///
/// Both create operations are fire-and-forget from the pipeline's
/// perspective: only the assigned id is consumed.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a leak record, returning its assigned id.
    async fn create_leak_detection(&self, leak: &LeakDetection) -> Result<u64, StorageError>;

    /// Persist an alert, returning its assigned id.
    async fn create_alert(&self, alert: &Alert) -> Result<u64, StorageError>;

    /// The most recent unresolved leak record for `sensor_id` detected at or
    /// after `since`, if any. Drives open-leak alert suppression.
    async fn open_leak_since(
        &self,
        sensor_id: u64,
        since: DateTime<Utc>,
    ) -> Result<Option<LeakDetection>, StorageError>;
}

//! Fire-and-forget reading dispatch
//!
//! Ingestion must never block on model training or window statistics, so
//! every reading becomes its own tokio task. Tasks are tracked so shutdown
//! can drain in-flight analyses, and a task failure is logged without
//! affecting other sensors' work.

use crate::pipeline::{DetectionOutcome, DetectionPipeline};
use crate::types::Reading;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

/// Dispatches readings into independent analysis tasks.
pub struct ReadingDispatcher {
    pipeline: Arc<DetectionPipeline>,
    tracker: TaskTracker,
}

impl ReadingDispatcher {
    pub fn new(pipeline: Arc<DetectionPipeline>) -> Self {
        Self {
            pipeline,
            tracker: TaskTracker::new(),
        }
    }

    /// Spawn analysis for one reading and return immediately.
    pub fn dispatch(&self, reading: Reading) {
        let pipeline = Arc::clone(&self.pipeline);
        self.tracker.spawn(async move {
            let sensor_id = reading.sensor_id;
            match pipeline.handle_new_reading(&reading).await {
                Ok(outcome) => log_outcome(sensor_id, &outcome),
                Err(e) => {
                    // One sensor's failure never touches the others
                    error!(sensor_id, error = %e, "Reading analysis abandoned");
                }
            }
        });
    }

    /// Stop accepting work and wait for in-flight analyses to finish.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Number of analyses still in flight.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }
}

fn log_outcome(sensor_id: u64, outcome: &DetectionOutcome) {
    match outcome {
        DetectionOutcome::Ignored => debug!(sensor_id, "Reading from deactivated sensor ignored"),
        DetectionOutcome::Warmup => debug!(sensor_id, "Model warming up"),
        DetectionOutcome::Normal => {}
        DetectionOutcome::TransientAnomaly { confidence } => {
            info!(sensor_id, confidence, "Transient anomaly (no leak pattern)");
        }
        DetectionOutcome::Suppressed => {
            debug!(sensor_id, "Detection suppressed by open-leak cooldown");
        }
        DetectionOutcome::LeakConfirmed {
            leak_id,
            severity,
            loss_rate_lph,
            alerted,
        } => {
            info!(
                sensor_id,
                leak_id,
                severity = %severity,
                loss_rate_lph,
                alerted,
                "Leak detection recorded"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlertingConfig, DetectionConfig, TrainingConfig};
    use crate::sensors::SensorRegistry;
    use crate::storage::{MemoryRecordStore, MemoryTelemetryStore};
    use chrono::Utc;

    #[tokio::test]
    async fn test_dispatch_survives_missing_sensor() {
        let pipeline = Arc::new(DetectionPipeline::new(
            Arc::new(MemoryTelemetryStore::new()),
            Arc::new(MemoryRecordStore::new()),
            Arc::new(SensorRegistry::new()),
            TrainingConfig::default(),
            DetectionConfig::default(),
            AlertingConfig::default(),
        ));
        let dispatcher = ReadingDispatcher::new(pipeline);

        // Unknown sensor: the task logs and exits, the dispatcher lives on
        dispatcher.dispatch(Reading {
            sensor_id: 999,
            timestamp: Utc::now(),
            flow_rate: Some(1.0),
            pressure: Some(40.0),
            battery_level: 100,
        });
        dispatcher.shutdown().await;
        assert_eq!(dispatcher.in_flight(), 0);
    }
}

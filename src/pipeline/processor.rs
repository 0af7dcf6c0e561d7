//! Per-reading detection sequence
//!
//! One reading flows through up to five stages, and exiting early at any of
//! them is a normal, quiet termination — "not enough evidence yet" is not an
//! error:
//!
//! 1. sensor lookup (unknown id is the only hard failure)
//! 2. anomaly model train-if-needed (insufficient history => warm-up)
//! 3. anomaly scoring against the acceptance threshold
//! 4. continuous-flow confirmation and loss-rate sizing
//! 5. dedup check, then leak record + alert persistence

use crate::alerting::{AlertComposer, OpenLeakSuppression};
use crate::config::{AlertingConfig, DetectionConfig, TrainingConfig};
use crate::detection::{classify_loss_rate, AnomalyModel, ContinuousFlowAnalyzer};
use crate::sensors::SensorRegistry;
use crate::storage::{RecordStore, StorageError, TelemetryStore};
use crate::types::{LeakDetection, LeakSeverity, Reading};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Hard failures for one unit of work. Anything evidential ("not yet
/// decidable") is a [`DetectionOutcome`], not an error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("reading references unknown sensor id {0}")]
    MissingSensor(u64),

    #[error("model training for sensor {0} exceeded {1}s")]
    TrainingTimeout(u64, u64),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// How the pipeline disposed of one reading.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    /// Sensor is deactivated; reading recorded as telemetry only
    Ignored,
    /// Model untrained and history insufficient — normal warm-up state
    Warmup,
    /// Reading is ordinary telemetry (not anomalous, or not confidently so)
    Normal,
    /// Anomalous point, but the window does not match the leak pattern
    /// (spike, dropout, noise burst)
    TransientAnomaly { confidence: f64 },
    /// Leak pattern confirmed, but an unresolved leak already covers it
    Suppressed,
    /// Leak confirmed and persisted. `alerted` is false when the alert write
    /// failed after the leak record was stored (the record stands).
    LeakConfirmed {
        leak_id: u64,
        severity: LeakSeverity,
        loss_rate_lph: f64,
        alerted: bool,
    },
}

/// Orchestrates detection for all sensors at a site.
///
/// Per-sensor anomaly models live in a registry keyed by sensor id. The map
/// lock is held only for lookup/insert; training and scoring run on the
/// model's own synchronization (serialized training, lock-free scoring), so
/// readings for different sensors proceed fully in parallel.
pub struct DetectionPipeline {
    telemetry: Arc<dyn TelemetryStore>,
    records: Arc<dyn RecordStore>,
    sensors: Arc<SensorRegistry>,
    models: RwLock<HashMap<u64, Arc<AnomalyModel>>>,
    analyzer: ContinuousFlowAnalyzer,
    suppression: OpenLeakSuppression,
    training_cfg: TrainingConfig,
    detection_cfg: DetectionConfig,
}

impl DetectionPipeline {
    pub fn new(
        telemetry: Arc<dyn TelemetryStore>,
        records: Arc<dyn RecordStore>,
        sensors: Arc<SensorRegistry>,
        training_cfg: TrainingConfig,
        detection_cfg: DetectionConfig,
        alerting_cfg: AlertingConfig,
    ) -> Self {
        Self {
            telemetry,
            records,
            sensors,
            models: RwLock::new(HashMap::new()),
            analyzer: ContinuousFlowAnalyzer::new(detection_cfg),
            suppression: OpenLeakSuppression::new(alerting_cfg),
            training_cfg,
            detection_cfg,
        }
    }

    /// Construct from the global site config.
    pub fn from_config(
        telemetry: Arc<dyn TelemetryStore>,
        records: Arc<dyn RecordStore>,
        sensors: Arc<SensorRegistry>,
    ) -> Self {
        let cfg = crate::config::get();
        Self::new(
            telemetry,
            records,
            sensors,
            cfg.training,
            cfg.detection,
            cfg.alerting,
        )
    }

    /// Analyze one reading end to end.
    ///
    /// The reading is assumed already persisted by the ingestion loop; this
    /// method only reads telemetry and conditionally writes leak/alert
    /// records. Those two writes are transactionally independent: a failed
    /// alert write never rolls back the leak record.
    pub async fn handle_new_reading(
        &self,
        reading: &Reading,
    ) -> Result<DetectionOutcome, PipelineError> {
        // Stage 1: sensor lookup
        let sensor = self
            .sensors
            .get(reading.sensor_id)
            .ok_or(PipelineError::MissingSensor(reading.sensor_id))?;
        if !sensor.is_active {
            self.discard_model(sensor.id);
            return Ok(DetectionOutcome::Ignored);
        }

        // Stage 2: train-if-needed, bounded defensively
        let model = self.model_for(sensor.id);
        if !model.is_trained() {
            let timeout = Duration::from_secs(self.training_cfg.timeout_secs);
            let trained = tokio::time::timeout(timeout, model.train(self.telemetry.as_ref(), sensor.id))
                .await
                .map_err(|_| {
                    PipelineError::TrainingTimeout(sensor.id, self.training_cfg.timeout_secs)
                })??;
            if !trained {
                return Ok(DetectionOutcome::Warmup);
            }
        }

        // Stage 3: anomaly scoring. A reading missing either channel carries
        // no scoreable signal and passes as ordinary telemetry.
        let Some([flow, pressure]) = reading.feature_pair() else {
            debug!(sensor_id = sensor.id, "Reading missing flow or pressure, skipping scoring");
            return Ok(DetectionOutcome::Normal);
        };
        let (is_anomaly, confidence) = model.detect_anomaly(flow, pressure);
        if !is_anomaly || confidence < self.detection_cfg.confidence_threshold {
            return Ok(DetectionOutcome::Normal);
        }

        // Stage 4: confirmation. The anomaly model says "something is off";
        // only the sustained-flow pattern makes it an actionable leak.
        let verdict = self
            .analyzer
            .detect_continuous_flow(self.telemetry.as_ref(), sensor.id)
            .await?;
        if !verdict.has_leak {
            debug!(
                sensor_id = sensor.id,
                confidence,
                mean_flow = verdict.mean_flow,
                flow_stddev = verdict.flow_stddev,
                "Anomaly without sustained-flow pattern"
            );
            return Ok(DetectionOutcome::TransientAnomaly { confidence });
        }

        // Stage 5: dedup, classify, persist
        if self
            .suppression
            .should_suppress(self.records.as_ref(), sensor.id, reading.timestamp)
            .await?
        {
            return Ok(DetectionOutcome::Suppressed);
        }

        let (severity, priority) = classify_loss_rate(verdict.estimated_loss_rate);
        let mut leak = LeakDetection::new(
            sensor.id,
            reading.timestamp,
            severity,
            verdict.estimated_loss_rate,
            confidence,
        );
        leak.id = self.records.create_leak_detection(&leak).await?;

        info!(
            sensor_id = sensor.id,
            leak_id = leak.id,
            severity = %severity,
            loss_rate_lph = verdict.estimated_loss_rate,
            confidence,
            "Leak confirmed"
        );

        let alert = AlertComposer::compose_leak_alert(&sensor, &leak, priority);
        let alerted = match self.records.create_alert(&alert).await {
            Ok(alert_id) => {
                info!(sensor_id = sensor.id, alert_id, priority = %priority, "Alert raised");
                true
            }
            Err(e) => {
                // Partial success: the leak record is the source of truth,
                // the next unsuppressed detection cycle re-raises alerting
                error!(sensor_id = sensor.id, leak_id = leak.id, error = %e, "Alert write failed after leak record persisted");
                false
            }
        };

        Ok(DetectionOutcome::LeakConfirmed {
            leak_id: leak.id,
            severity,
            loss_rate_lph: verdict.estimated_loss_rate,
            alerted,
        })
    }

    /// Look up or lazily create the sensor's model.
    fn model_for(&self, sensor_id: u64) -> Arc<AnomalyModel> {
        if let Some(model) = self
            .models
            .read()
            .expect("model registry lock poisoned")
            .get(&sensor_id)
        {
            return Arc::clone(model);
        }
        let mut models = self.models.write().expect("model registry lock poisoned");
        Arc::clone(
            models
                .entry(sensor_id)
                .or_insert_with(|| Arc::new(AnomalyModel::new(self.training_cfg))),
        )
    }

    /// Drop a deactivated sensor's model.
    fn discard_model(&self, sensor_id: u64) {
        if self
            .models
            .write()
            .expect("model registry lock poisoned")
            .remove(&sensor_id)
            .is_some()
        {
            warn!(sensor_id, "Discarded anomaly model for deactivated sensor");
        }
    }

    /// Number of live per-sensor models (diagnostics).
    pub fn model_count(&self) -> usize {
        self.models
            .read()
            .expect("model registry lock poisoned")
            .len()
    }
}

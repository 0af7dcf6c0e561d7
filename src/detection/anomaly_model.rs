//! Per-sensor anomaly model
//!
//! Wraps the isolation forest with the training lifecycle the pipeline
//! relies on: minimum-sample gating, cold-start safety, and race-free
//! retraining via a copy-on-write model handle.

use crate::config::TrainingConfig;
use crate::detection::isolation_forest::{ForestParams, IsolationForest};
use crate::storage::{StorageError, TelemetryStore};
use crate::types::Reading;
use arc_swap::ArcSwapOption;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Unsupervised novelty detector for one sensor's (flow, pressure) behavior.
///
/// Concurrency: scoring reads the fitted forest through an `ArcSwapOption`
/// handle and never blocks. Training serializes on an async mutex; a task
/// that loses the race observes the winner's model and skips the refit.
pub struct AnomalyModel {
    cfg: TrainingConfig,
    fitted: ArcSwapOption<IsolationForest>,
    train_lock: tokio::sync::Mutex<()>,
}

impl AnomalyModel {
    pub fn new(cfg: TrainingConfig) -> Self {
        Self {
            cfg,
            fitted: ArcSwapOption::empty(),
            train_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.fitted.load().is_some()
    }

    /// Fit the model on the sensor's recent history.
    ///
    /// Pulls the trailing `window_days` of readings, projects them to
    /// `(flow, pressure)` pairs (readings with a missing channel are
    /// dropped), and refuses to fit on fewer than `min_samples` pairs.
    ///
    /// Returns `Ok(true)` when the model is trained after the call — either
    /// by this fit or by a concurrent one that finished first. Returns
    /// `Ok(false)` when history is insufficient or the fit failed on
    /// degenerate input; both leave the model untrained and are normal,
    /// quiet outcomes. Only storage failures surface as errors.
    pub async fn train(
        &self,
        store: &dyn TelemetryStore,
        sensor_id: u64,
    ) -> Result<bool, StorageError> {
        let _guard = self.train_lock.lock().await;
        if self.is_trained() {
            debug!(sensor_id, "Model already trained by a concurrent task, skipping refit");
            return Ok(true);
        }

        let since = Utc::now() - Duration::days(self.cfg.window_days);
        let readings = store.readings_since(sensor_id, since).await?;
        let samples: Vec<[f64; 2]> = readings.iter().filter_map(Reading::feature_pair).collect();

        if samples.len() < self.cfg.min_samples {
            debug!(
                sensor_id,
                valid_samples = samples.len(),
                required = self.cfg.min_samples,
                "Insufficient history to train anomaly model"
            );
            return Ok(false);
        }

        let params = ForestParams {
            num_trees: self.cfg.num_trees,
            sample_size: self.cfg.sample_size,
            seed: self.cfg.seed,
        };
        match IsolationForest::fit(&samples, &params) {
            Ok(forest) => {
                self.fitted.store(Some(Arc::new(forest)));
                info!(
                    sensor_id,
                    samples = samples.len(),
                    trees = params.num_trees,
                    "Anomaly model trained"
                );
                Ok(true)
            }
            Err(e) => {
                warn!(sensor_id, error = %e, "Model fit failed, model remains untrained");
                Ok(false)
            }
        }
    }

    /// Score a single point.
    ///
    /// Untrained models deterministically return `(false, 0.0)` — cold start
    /// never blocks on training and never raises. Trained models return the
    /// forest's normalized score (see `isolation_forest` docs for the scale)
    /// with the anomaly vote taken at `score_threshold`.
    pub fn detect_anomaly(&self, flow_rate: f64, pressure: f64) -> (bool, f64) {
        match self.fitted.load_full() {
            None => (false, 0.0),
            Some(forest) => {
                let score = forest.score([flow_rate, pressure]);
                (score > self.cfg.score_threshold, score)
            }
        }
    }
}

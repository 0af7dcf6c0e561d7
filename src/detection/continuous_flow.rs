//! Continuous-flow (leak) statistical test
//!
//! Sustained, near-constant, non-zero flow over a multi-hour window is the
//! signature of a pipe leaking at a roughly constant rate. Normal usage is
//! intermittent and high-variance, so the test is mean-plus-flatness:
//! mean flow above a floor AND standard deviation below a fraction of the
//! mean. This runs on the raw window only — no trained model required.

use crate::config::DetectionConfig;
use crate::storage::{StorageError, TelemetryStore};
use chrono::{Duration, Utc};
use statrs::statistics::Statistics;
use tracing::debug;

/// Outcome of one continuous-flow check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowVerdict {
    pub has_leak: bool,
    /// Estimated volumetric loss (liters/hour); 0.0 when no leak
    pub estimated_loss_rate: f64,
    /// Readings found in the window (including null-flow ones)
    pub sample_count: usize,
    /// Mean of non-null flow values (liters/minute); 0.0 when none exist
    pub mean_flow: f64,
    /// Population standard deviation of non-null flow values
    pub flow_stddev: f64,
}

impl FlowVerdict {
    fn no_leak(sample_count: usize) -> Self {
        Self {
            has_leak: false,
            estimated_loss_rate: 0.0,
            sample_count,
            mean_flow: 0.0,
            flow_stddev: 0.0,
        }
    }
}

/// Rolling-window detector for the sustained-flow leak pattern.
pub struct ContinuousFlowAnalyzer {
    cfg: DetectionConfig,
}

impl ContinuousFlowAnalyzer {
    pub fn new(cfg: DetectionConfig) -> Self {
        Self { cfg }
    }

    /// Test the sensor's trailing `window_hours` of readings.
    ///
    /// Fails closed (no leak) when fewer than `min_window_readings` exist in
    /// the window, or when no reading carries a flow value — insufficient
    /// evidence for a sustained pattern either way.
    pub async fn detect_continuous_flow(
        &self,
        store: &dyn TelemetryStore,
        sensor_id: u64,
    ) -> Result<FlowVerdict, StorageError> {
        let since = Utc::now() - Duration::hours(self.cfg.window_hours);
        let readings = store.readings_since(sensor_id, since).await?;

        if readings.len() < self.cfg.min_window_readings {
            debug!(
                sensor_id,
                window_readings = readings.len(),
                required = self.cfg.min_window_readings,
                "Too few readings in window for continuous-flow test"
            );
            return Ok(FlowVerdict::no_leak(readings.len()));
        }

        // Null flow channels are excluded, never treated as zero
        let flows: Vec<f64> = readings
            .iter()
            .filter_map(|r| r.flow_rate)
            .filter(|f| f.is_finite())
            .collect();
        if flows.is_empty() {
            return Ok(FlowVerdict::no_leak(readings.len()));
        }

        let mean = flows.iter().mean();
        let stddev = flows.iter().population_std_dev();

        let has_leak =
            mean > self.cfg.min_leak_flow_lpm && stddev < self.cfg.flow_variation_coefficient * mean;

        let estimated_loss_rate = if has_leak {
            // liters/minute -> liters/hour
            mean * 60.0
        } else {
            0.0
        };

        Ok(FlowVerdict {
            has_leak,
            estimated_loss_rate,
            sample_count: readings.len(),
            mean_flow: mean,
            flow_stddev: stddev,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTelemetryStore;
    use crate::types::Reading;

    async fn store_with_flows(flows: &[Option<f64>]) -> MemoryTelemetryStore {
        let store = MemoryTelemetryStore::new();
        let now = Utc::now();
        for (i, flow) in flows.iter().enumerate() {
            store
                .append(&Reading {
                    sensor_id: 1,
                    timestamp: now - Duration::minutes((flows.len() - i) as i64 * 30),
                    flow_rate: *flow,
                    pressure: Some(45.0),
                    battery_level: 100,
                })
                .await
                .unwrap();
        }
        store
    }

    fn analyzer() -> ContinuousFlowAnalyzer {
        ContinuousFlowAnalyzer::new(DetectionConfig::default())
    }

    #[tokio::test]
    async fn test_flat_nonzero_flow_is_a_leak() {
        let store = store_with_flows(&vec![Some(25.0); 30]).await;
        let verdict = analyzer().detect_continuous_flow(&store, 1).await.unwrap();

        assert!(verdict.has_leak);
        assert_eq!(verdict.estimated_loss_rate, 1500.0); // 25 lpm * 60
        assert_eq!(verdict.mean_flow, 25.0);
        assert_eq!(verdict.flow_stddev, 0.0);
    }

    #[tokio::test]
    async fn test_high_variance_same_mean_is_not_a_leak() {
        // Alternating 5/45: mean 25 but stddev 20, way above 0.2 * 25
        let flows: Vec<Option<f64>> = (0..30)
            .map(|i| Some(if i % 2 == 0 { 5.0 } else { 45.0 }))
            .collect();
        let store = store_with_flows(&flows).await;
        let verdict = analyzer().detect_continuous_flow(&store, 1).await.unwrap();

        assert!(!verdict.has_leak);
        assert_eq!(verdict.estimated_loss_rate, 0.0);
    }

    #[tokio::test]
    async fn test_insufficient_window_fails_closed() {
        // 19 perfectly flat non-zero readings: still no verdict
        let store = store_with_flows(&vec![Some(25.0); 19]).await;
        let verdict = analyzer().detect_continuous_flow(&store, 1).await.unwrap();

        assert!(!verdict.has_leak);
        assert_eq!(verdict.estimated_loss_rate, 0.0);
        assert_eq!(verdict.sample_count, 19);
    }

    #[tokio::test]
    async fn test_all_null_flows_fail_closed() {
        let store = store_with_flows(&vec![None; 30]).await;
        let verdict = analyzer().detect_continuous_flow(&store, 1).await.unwrap();

        assert!(!verdict.has_leak);
        assert_eq!(verdict.mean_flow, 0.0);
    }

    #[tokio::test]
    async fn test_null_flows_excluded_not_zeroed() {
        // 25 flat readings plus 10 nulls. Treating nulls as zero would
        // spike the variance and hide the leak.
        let mut flows = vec![Some(25.0); 25];
        flows.extend(vec![None; 10]);
        let store = store_with_flows(&flows).await;
        let verdict = analyzer().detect_continuous_flow(&store, 1).await.unwrap();

        assert!(verdict.has_leak);
        assert_eq!(verdict.estimated_loss_rate, 1500.0);
    }

    #[tokio::test]
    async fn test_trickle_below_flow_floor_is_not_a_leak() {
        // Perfectly flat but mean 0.4 lpm < 0.5 floor
        let store = store_with_flows(&vec![Some(0.4); 30]).await;
        let verdict = analyzer().detect_continuous_flow(&store, 1).await.unwrap();

        assert!(!verdict.has_leak);
    }
}

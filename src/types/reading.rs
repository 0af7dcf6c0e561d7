//! Telemetry reading types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped telemetry sample from a field sensor.
///
/// `flow_rate` and `pressure` are `Option` because a faulting sensor can
/// report a sample with either channel missing. Missing channels are excluded
/// from all statistics downstream; they are never coerced to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    /// Internal id of the reporting sensor
    pub sensor_id: u64,
    /// Sample time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Flow rate (liters/minute)
    pub flow_rate: Option<f64>,
    /// Line pressure (psi)
    pub pressure: Option<f64>,
    /// Battery charge (percent)
    #[serde(default = "default_battery_level")]
    pub battery_level: u8,
}

fn default_battery_level() -> u8 {
    100
}

impl Reading {
    /// Project this reading onto the `(flow, pressure)` feature plane used by
    /// the anomaly model.
    ///
    /// Returns `None` when either channel is missing or non-finite; such
    /// samples carry no usable signal for the model.
    pub fn feature_pair(&self) -> Option<[f64; 2]> {
        match (self.flow_rate, self.pressure) {
            (Some(flow), Some(pressure)) if flow.is_finite() && pressure.is_finite() => {
                Some([flow, pressure])
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(flow: Option<f64>, pressure: Option<f64>) -> Reading {
        Reading {
            sensor_id: 1,
            timestamp: Utc::now(),
            flow_rate: flow,
            pressure,
            battery_level: 100,
        }
    }

    #[test]
    fn test_feature_pair_requires_both_channels() {
        assert_eq!(reading(Some(2.0), Some(50.0)).feature_pair(), Some([2.0, 50.0]));
        assert_eq!(reading(None, Some(50.0)).feature_pair(), None);
        assert_eq!(reading(Some(2.0), None).feature_pair(), None);
        assert_eq!(reading(None, None).feature_pair(), None);
    }

    #[test]
    fn test_feature_pair_rejects_non_finite() {
        assert_eq!(reading(Some(f64::NAN), Some(50.0)).feature_pair(), None);
        assert_eq!(reading(Some(2.0), Some(f64::INFINITY)).feature_pair(), None);
    }

    #[test]
    fn test_battery_level_defaults_to_full() {
        let r: Reading =
            serde_json::from_str(r#"{"sensor_id":1,"timestamp":"2026-01-01T00:00:00Z","flow_rate":1.0,"pressure":40.0}"#)
                .unwrap();
        assert_eq!(r.battery_level, 100);
    }
}

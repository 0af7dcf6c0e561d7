//! Sensor device identity and deployment context

use serde::{Deserialize, Serialize};

/// Physical sensor hardware class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorType {
    /// Ultrasonic flow sensor
    Flow,
    /// Pressure sensor
    Pressure,
}

/// Where a sensor is deployed, which drives alert phrasing.
///
/// Municipal operators care about magnitude and location; residential
/// societies get an actionable maintenance prompt instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deployment {
    /// Municipal distribution network
    Municipal,
    /// Residential society
    Residential,
}

impl std::fmt::Display for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Deployment::Municipal => write!(f, "Municipal"),
            Deployment::Residential => write!(f, "Residential"),
        }
    }
}

/// A registered field sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorDevice {
    /// Internal id referenced by readings, leaks and alerts
    pub id: u64,
    /// Human-assigned device identifier (e.g. "FLOW-NORTH-07")
    pub device_id: String,
    pub sensor_type: SensorType,
    pub deployment: Deployment,
    /// Installation location description
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Inactive sensors still report readings during decommissioning but are
    /// excluded from analysis.
    pub is_active: bool,
}

impl SensorDevice {
    /// Convenience constructor for an active sensor without coordinates.
    pub fn new(
        id: u64,
        device_id: impl Into<String>,
        sensor_type: SensorType,
        deployment: Deployment,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id,
            device_id: device_id.into(),
            sensor_type,
            deployment,
            location: location.into(),
            latitude: None,
            longitude: None,
            is_active: true,
        }
    }
}

//! Operator-facing alert types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What an alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    /// Leak confirmed by the detection pipeline
    Leak,
    /// Sustained flow without a confirmed leak record
    ContinuousFlow,
    /// Consumption above the zone's expected envelope
    HighConsumption,
    /// Sensor stopped reporting
    SensorOffline,
    /// Line pressure below operational minimum
    LowPressure,
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertType::Leak => write!(f, "LEAK"),
            AlertType::ContinuousFlow => write!(f, "CONTINUOUS_FLOW"),
            AlertType::HighConsumption => write!(f, "HIGH_CONSUMPTION"),
            AlertType::SensorOffline => write!(f, "SENSOR_OFFLINE"),
            AlertType::LowPressure => write!(f, "LOW_PRESSURE"),
        }
    }
}

/// Operator urgency tier, derived from leak severity for leak alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl std::fmt::Display for AlertPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertPriority::Low => write!(f, "LOW"),
            AlertPriority::Medium => write!(f, "MEDIUM"),
            AlertPriority::High => write!(f, "HIGH"),
            AlertPriority::Urgent => write!(f, "URGENT"),
        }
    }
}

/// An operator notification.
///
/// `is_read` / `is_resolved` are mutated only by the operator-facing
/// collaborator; the pipeline creates alerts and never touches them again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Record id, assigned by the record store on insert (0 until persisted)
    pub id: u64,
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub sensor_id: u64,
    /// Backing leak record for `Leak` alerts
    pub leak_id: Option<u64>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub is_resolved: bool,
}

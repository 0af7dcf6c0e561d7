//! Leak detection records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordinal leak seriousness derived from estimated loss rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LeakSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for LeakSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeakSeverity::Low => write!(f, "LOW"),
            LeakSeverity::Medium => write!(f, "MEDIUM"),
            LeakSeverity::High => write!(f, "HIGH"),
            LeakSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Operator workflow state of a leak record.
///
/// The detection pipeline only ever creates records in `Detected`; all later
/// transitions belong to the operator-facing workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeakStatus {
    Detected,
    Investigating,
    Confirmed,
    Repaired,
    FalseAlarm,
}

impl LeakStatus {
    /// A resolved leak no longer suppresses new detections for its sensor.
    pub fn is_resolved(&self) -> bool {
        matches!(self, LeakStatus::Repaired | LeakStatus::FalseAlarm)
    }
}

impl std::fmt::Display for LeakStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeakStatus::Detected => write!(f, "DETECTED"),
            LeakStatus::Investigating => write!(f, "INVESTIGATING"),
            LeakStatus::Confirmed => write!(f, "CONFIRMED"),
            LeakStatus::Repaired => write!(f, "REPAIRED"),
            LeakStatus::FalseAlarm => write!(f, "FALSE_ALARM"),
        }
    }
}

/// A confirmed continuous-flow event.
///
/// Invariants enforced by [`LeakDetection::new`]:
/// - `estimated_loss_rate >= 0` (liters/hour)
/// - `confidence_score` clamped to `[0, 1]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeakDetection {
    /// Record id, assigned by the record store on insert (0 until persisted)
    pub id: u64,
    pub sensor_id: u64,
    pub detected_at: DateTime<Utc>,
    pub severity: LeakSeverity,
    pub status: LeakStatus,
    /// Estimated volumetric loss (liters/hour)
    pub estimated_loss_rate: f64,
    /// Model confidence in `[0, 1]`
    pub confidence_score: f64,
    pub resolved_at: Option<DateTime<Utc>>,
    pub notes: String,
}

impl LeakDetection {
    /// Build a fresh `Detected` record, enforcing the field invariants.
    pub fn new(
        sensor_id: u64,
        detected_at: DateTime<Utc>,
        severity: LeakSeverity,
        estimated_loss_rate: f64,
        confidence_score: f64,
    ) -> Self {
        Self {
            id: 0,
            sensor_id,
            detected_at,
            severity,
            status: LeakStatus::Detected,
            estimated_loss_rate: estimated_loss_rate.max(0.0),
            confidence_score: confidence_score.clamp(0.0, 1.0),
            resolved_at: None,
            notes: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(LeakSeverity::Low < LeakSeverity::Medium);
        assert!(LeakSeverity::Medium < LeakSeverity::High);
        assert!(LeakSeverity::High < LeakSeverity::Critical);
    }

    #[test]
    fn test_new_record_starts_detected() {
        let leak = LeakDetection::new(7, Utc::now(), LeakSeverity::Medium, 480.0, 0.85);
        assert_eq!(leak.status, LeakStatus::Detected);
        assert_eq!(leak.id, 0);
        assert!(leak.resolved_at.is_none());
    }

    #[test]
    fn test_invariants_enforced() {
        let leak = LeakDetection::new(7, Utc::now(), LeakSeverity::Low, -12.0, 3.5);
        assert_eq!(leak.estimated_loss_rate, 0.0);
        assert_eq!(leak.confidence_score, 1.0);
    }

    #[test]
    fn test_resolved_statuses() {
        assert!(LeakStatus::Repaired.is_resolved());
        assert!(LeakStatus::FalseAlarm.is_resolved());
        assert!(!LeakStatus::Detected.is_resolved());
        assert!(!LeakStatus::Investigating.is_resolved());
        assert!(!LeakStatus::Confirmed.is_resolved());
    }
}

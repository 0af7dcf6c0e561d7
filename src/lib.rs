//! AquaSentry: Water Distribution Leak Detection
//!
//! Turns per-sensor flow/pressure telemetry into classified leak records and
//! deduplicated operator alerts.
//!
//! ## Architecture
//!
//! - **Anomaly Model**: per-sensor isolation forest over (flow, pressure)
//! - **Continuous-Flow Analyzer**: rolling-window test for sustained flow
//! - **Severity Classifier**: loss rate to severity/priority bands
//! - **Alert Composer**: deployment-aware messaging with open-leak suppression
//! - **Detection Pipeline**: per-reading orchestration on independent tasks

pub mod config;
pub mod types;
pub mod sensors;
pub mod storage;
pub mod detection;
pub mod alerting;
pub mod pipeline;
pub mod simulate;

// Re-export site configuration
pub use config::SiteConfig;

// Re-export commonly used types
pub use types::{
    Alert, AlertPriority, AlertType, Deployment, LeakDetection, LeakSeverity, LeakStatus,
    Reading, SensorDevice, SensorType,
};

// Re-export detection components
pub use detection::{classify_loss_rate, AnomalyModel, ContinuousFlowAnalyzer, FlowVerdict};

// Re-export pipeline
pub use pipeline::{DetectionOutcome, DetectionPipeline, PipelineError, ReadingDispatcher};

// Re-export storage collaborators
pub use sensors::SensorRegistry;
pub use storage::{RecordStore, StorageError, TelemetryStore};

//! Leak Detection Engine
//!
//! Statistical core of the pipeline:
//! - `isolation_forest`: unsupervised outlier scoring over (flow, pressure)
//! - `anomaly_model`: per-sensor trained model with the minimum-sample gate
//! - `continuous_flow`: rolling-window test for sustained near-constant flow
//! - `severity`: loss-rate to severity/priority classification
//!
//! The anomaly model is the trigger ("something is off at this sensor") and
//! the continuous-flow test is the confirmation ("and it looks like a leak,
//! losing roughly this much water per hour").

mod isolation_forest;
mod anomaly_model;
mod continuous_flow;
mod severity;

pub use isolation_forest::{FitError, ForestParams, IsolationForest};
pub use anomaly_model::AnomalyModel;
pub use continuous_flow::{ContinuousFlowAnalyzer, FlowVerdict};
pub use severity::{classify_loss_rate, SEVERITY_BANDS};

//! Shared data structures for the water telemetry detection pipeline
//!
//! This module defines the core types flowing through the system:
//! - `Reading`: one timestamped telemetry sample from a field sensor
//! - `SensorDevice`: sensor identity and deployment context
//! - `LeakDetection`: a confirmed continuous-flow event with severity
//! - `Alert`: the operator-facing notification backed by a leak record

mod reading;
mod sensor;
mod leak;
mod alert;

pub use reading::*;
pub use sensor::*;
pub use leak::*;
pub use alert::*;

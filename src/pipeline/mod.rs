//! Detection pipeline orchestration
//!
//! - `processor`: per-reading decision sequence (model, confirmation,
//!   classification, alerting)
//! - `dispatcher`: fire-and-forget task dispatch so ingestion never blocks
//!   on training or statistics
//! - `source`: where readings come from (stdin JSON, simulator)

mod processor;
mod dispatcher;
pub mod source;

pub use processor::{DetectionOutcome, DetectionPipeline, PipelineError};
pub use dispatcher::ReadingDispatcher;

//! Alert composition and deduplication
//!
//! - `composer`: deployment-context-aware alert text for confirmed leaks
//! - `dedup`: open-leak suppression, the cooldown policy that keeps one
//!   sustained event from flooding operators with duplicate alerts

mod composer;
mod dedup;

pub use composer::AlertComposer;
pub use dedup::OpenLeakSuppression;

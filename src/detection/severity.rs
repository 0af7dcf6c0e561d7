//! Loss-rate severity classification
//!
//! Pure, total mapping from estimated loss rate (liters/hour) to the leak
//! severity and the matching alert priority. The two scales are held in one
//! ordered band table so they cannot drift apart under future edits.

use crate::types::{AlertPriority, LeakSeverity};

/// Classification bands, highest first. A loss rate strictly above a band's
/// floor takes that band; anything at or below every floor is `Low`/`Low`.
///
/// Boundaries are strict: exactly 1000 L/hr is High, not Critical. Operator
/// urgency hangs on these edges — do not loosen them to `>=`.
pub const SEVERITY_BANDS: [(f64, LeakSeverity, AlertPriority); 3] = [
    (1000.0, LeakSeverity::Critical, AlertPriority::Urgent),
    (500.0, LeakSeverity::High, AlertPriority::High),
    (100.0, LeakSeverity::Medium, AlertPriority::Medium),
];

/// Classify an estimated loss rate (liters/hour).
pub fn classify_loss_rate(loss_rate_lph: f64) -> (LeakSeverity, AlertPriority) {
    for (floor, severity, priority) in SEVERITY_BANDS {
        if loss_rate_lph > floor {
            return (severity, priority);
        }
    }
    (LeakSeverity::Low, AlertPriority::Low)
}

//! Deployment-aware alert composition

use crate::types::{Alert, AlertPriority, AlertType, Deployment, LeakDetection, SensorDevice};
use chrono::Utc;

/// Builds the operator-facing alert for a confirmed leak.
pub struct AlertComposer;

impl AlertComposer {
    /// Compose a `Leak` alert linked to the persisted leak record.
    ///
    /// The classified priority is forwarded unchanged; only the message
    /// varies with deployment context.
    pub fn compose_leak_alert(
        sensor: &SensorDevice,
        leak: &LeakDetection,
        priority: AlertPriority,
    ) -> Alert {
        Alert {
            id: 0,
            alert_type: AlertType::Leak,
            priority,
            sensor_id: sensor.id,
            leak_id: Some(leak.id),
            message: Self::leak_message(sensor, leak.estimated_loss_rate),
            created_at: Utc::now(),
            is_read: false,
            is_resolved: false,
        }
    }

    /// Municipal operators get magnitude and location; residential societies
    /// get an actionable maintenance prompt.
    fn leak_message(sensor: &SensorDevice, loss_rate_lph: f64) -> String {
        match sensor.deployment {
            Deployment::Municipal => format!(
                "Major leak detected at {}. Estimated loss: {:.1} L/hr",
                sensor.location, loss_rate_lph
            ),
            Deployment::Residential => format!(
                "Continuous flow detected for 24 hours. Check for leaks. Estimated loss: {:.1} L/hr",
                loss_rate_lph
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LeakSeverity, SensorType};

    fn sensor(deployment: Deployment) -> SensorDevice {
        SensorDevice::new(
            4,
            "FLOW-EAST-02",
            SensorType::Flow,
            deployment,
            "East Ridge pumping station",
        )
    }

    fn leak() -> LeakDetection {
        let mut l = LeakDetection::new(4, Utc::now(), LeakSeverity::Medium, 480.0, 0.85);
        l.id = 17;
        l
    }

    #[test]
    fn test_municipal_message_names_location_and_magnitude() {
        let alert =
            AlertComposer::compose_leak_alert(&sensor(Deployment::Municipal), &leak(), AlertPriority::Medium);

        assert_eq!(
            alert.message,
            "Major leak detected at East Ridge pumping station. Estimated loss: 480.0 L/hr"
        );
    }

    #[test]
    fn test_residential_message_is_a_maintenance_prompt() {
        let alert = AlertComposer::compose_leak_alert(
            &sensor(Deployment::Residential),
            &leak(),
            AlertPriority::Medium,
        );

        assert_eq!(
            alert.message,
            "Continuous flow detected for 24 hours. Check for leaks. Estimated loss: 480.0 L/hr"
        );
    }

    #[test]
    fn test_alert_links_leak_and_forwards_priority() {
        let alert =
            AlertComposer::compose_leak_alert(&sensor(Deployment::Municipal), &leak(), AlertPriority::Urgent);

        assert_eq!(alert.alert_type, AlertType::Leak);
        assert_eq!(alert.priority, AlertPriority::Urgent);
        assert_eq!(alert.leak_id, Some(17));
        assert_eq!(alert.sensor_id, 4);
        assert!(!alert.is_read);
        assert!(!alert.is_resolved);
    }
}

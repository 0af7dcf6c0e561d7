//! Sensor registry
//!
//! In-memory directory of registered sensors. Sensor CRUD lives in the
//! excluded admin surface; the pipeline only needs lookup and deactivation.

use crate::types::SensorDevice;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe directory of registered sensors, keyed by internal id.
#[derive(Default)]
pub struct SensorRegistry {
    sensors: RwLock<HashMap<u64, Arc<SensorDevice>>>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of devices.
    pub fn from_devices(devices: Vec<SensorDevice>) -> Self {
        let sensors = devices
            .into_iter()
            .map(|d| (d.id, Arc::new(d)))
            .collect();
        Self {
            sensors: RwLock::new(sensors),
        }
    }

    /// Register or replace a sensor.
    pub fn insert(&self, device: SensorDevice) {
        self.sensors
            .write()
            .expect("sensor registry lock poisoned")
            .insert(device.id, Arc::new(device));
    }

    /// Look up a sensor by internal id.
    pub fn get(&self, id: u64) -> Option<Arc<SensorDevice>> {
        self.sensors
            .read()
            .expect("sensor registry lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Mark a sensor inactive. Returns false for unknown ids.
    ///
    /// The pipeline discards the sensor's anomaly model when it next sees the
    /// sensor as inactive.
    pub fn deactivate(&self, id: u64) -> bool {
        let mut sensors = self.sensors.write().expect("sensor registry lock poisoned");
        match sensors.get(&id) {
            Some(existing) => {
                let mut device = (**existing).clone();
                device.is_active = false;
                sensors.insert(id, Arc::new(device));
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sensors
            .read()
            .expect("sensor registry lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Deployment, SensorType};

    #[test]
    fn test_lookup_and_deactivate() {
        let registry = SensorRegistry::from_devices(vec![SensorDevice::new(
            1,
            "FLOW-NORTH-07",
            SensorType::Flow,
            Deployment::Municipal,
            "North trunk main",
        )]);

        assert!(registry.get(1).unwrap().is_active);
        assert!(registry.deactivate(1));
        assert!(!registry.get(1).unwrap().is_active);
        assert!(!registry.deactivate(99));
        assert!(registry.get(99).is_none());
    }
}

//! Synthetic sensor traces
//!
//! Generates realistic reading streams for demos and tests: intermittent
//! normal usage, a steady leak, and a flaky sensor that drops channels.
//! This is a library module consumed by the `--simulate` source — it owns no
//! process state and shares nothing with the detection pipeline.

use crate::types::Reading;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Behavior profile for one simulated sensor.
#[derive(Debug, Clone, Copy)]
pub enum SimProfile {
    /// Intermittent household/zone usage: frequent zero-flow periods,
    /// high-variance bursts when taps run.
    NormalUsage,
    /// Steady leak at roughly `rate_lpm` liters/minute with small jitter —
    /// the low-variance signature the analyzer looks for.
    Leak { rate_lpm: f64 },
    /// Faulty sensor: readings frequently missing flow or pressure.
    Dropout,
}

/// Generates a reading stream for one sensor.
pub struct SensorSimulator {
    sensor_id: u64,
    profile: SimProfile,
    rng: StdRng,
}

impl SensorSimulator {
    pub fn new(sensor_id: u64, profile: SimProfile, seed: u64) -> Self {
        Self {
            sensor_id,
            profile,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sensor_id(&self) -> u64 {
        self.sensor_id
    }

    /// Produce the next reading, stamped at `now`.
    pub fn next_reading(&mut self, now: DateTime<Utc>) -> Reading {
        let (flow_rate, pressure) = match self.profile {
            SimProfile::NormalUsage => {
                // ~60% idle periods, bursts otherwise
                let flow = if self.rng.gen_bool(0.6) {
                    0.0
                } else {
                    sample_positive(&mut self.rng, 6.0, 4.0)
                };
                (Some(flow), Some(sample_positive(&mut self.rng, 50.0, 2.0)))
            }
            SimProfile::Leak { rate_lpm } => {
                // Jitter well inside the flatness threshold
                let flow = sample_positive(&mut self.rng, rate_lpm, rate_lpm * 0.05);
                // Leaks bleed line pressure down
                (Some(flow), Some(sample_positive(&mut self.rng, 38.0, 1.5)))
            }
            SimProfile::Dropout => {
                let flow = self
                    .rng
                    .gen_bool(0.5)
                    .then(|| sample_positive(&mut self.rng, 2.0, 1.0));
                let pressure = self
                    .rng
                    .gen_bool(0.5)
                    .then(|| sample_positive(&mut self.rng, 48.0, 3.0));
                (flow, pressure)
            }
        };

        Reading {
            sensor_id: self.sensor_id,
            timestamp: now,
            flow_rate,
            pressure,
            battery_level: self.rng.gen_range(40..=100),
        }
    }
}

fn sample_positive(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    // Degenerate std_dev only occurs from caller bugs; fall back to the mean
    let normal = match Normal::new(mean, std_dev) {
        Ok(n) => n,
        Err(_) => return mean,
    };
    normal.sample(rng).max(0.0)
}

//! Site Configuration - All detection thresholds as operator-tunable TOML values
//!
//! Every threshold that drives the leak detection pipeline is a field in this
//! module. Each struct implements `Default` with values matching the original
//! detection constants, ensuring zero-change behavior when no config file is
//! present.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a monitoring site deployment.
///
/// Load with `SiteConfig::load()` which searches:
/// 1. `$AQUASENTRY_CONFIG` env var
/// 2. `./site_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site identification and storage paths
    #[serde(default)]
    pub site: SiteInfo,

    /// Anomaly model training parameters
    #[serde(default)]
    pub training: TrainingConfig,

    /// Continuous-flow detection thresholds
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Alert deduplication policy
    #[serde(default)]
    pub alerting: AlertingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: SiteInfo::default(),
            training: TrainingConfig::default(),
            detection: DetectionConfig::default(),
            alerting: AlertingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration using the standard search order:
    /// 1. `$AQUASENTRY_CONFIG` environment variable
    /// 2. `./site_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("AQUASENTRY_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), site = %config.site.name, "Loaded site config from AQUASENTRY_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from AQUASENTRY_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "AQUASENTRY_CONFIG points to non-existent file, falling back");
            }
        }

        let cwd_path = Path::new("site_config.toml");
        if cwd_path.exists() {
            match Self::load_from_file(cwd_path) {
                Ok(config) => {
                    info!(site = %config.site.name, "Loaded ./site_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse ./site_config.toml, using defaults");
                }
            }
        }

        info!("No site config found, using built-in defaults");
        Self::default()
    }

    /// Parse a TOML config file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: SiteConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Site identification and storage paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    /// Display name of the monitored site
    #[serde(default = "defaults::site_name")]
    pub name: String,
    /// Directory for sled databases
    #[serde(default = "defaults::data_dir")]
    pub data_dir: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: defaults::site_name(),
            data_dir: defaults::data_dir(),
        }
    }
}

/// Anomaly model training parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// How far back training pulls history (days)
    #[serde(default = "defaults::window_days")]
    pub window_days: i64,
    /// Minimum valid `(flow, pressure)` pairs before a model may be fitted.
    /// Guards against overfitting on sparse history.
    #[serde(default = "defaults::min_samples")]
    pub min_samples: usize,
    /// Isolation forest ensemble size
    #[serde(default = "defaults::num_trees")]
    pub num_trees: usize,
    /// Subsample size per tree
    #[serde(default = "defaults::sample_size")]
    pub sample_size: usize,
    /// RNG seed for reproducible fits
    #[serde(default = "defaults::seed")]
    pub seed: u64,
    /// Defensive bound on a single training run (seconds)
    #[serde(default = "defaults::timeout_secs")]
    pub timeout_secs: u64,
    /// Anomaly score above which the model votes "anomalous".
    /// Scores are isolation-forest normalized: ~0.5 for average points,
    /// approaching 1.0 for isolates.
    #[serde(default = "defaults::score_threshold")]
    pub score_threshold: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            window_days: defaults::window_days(),
            min_samples: defaults::min_samples(),
            num_trees: defaults::num_trees(),
            sample_size: defaults::sample_size(),
            seed: defaults::seed(),
            timeout_secs: defaults::timeout_secs(),
            score_threshold: defaults::score_threshold(),
        }
    }
}

/// Continuous-flow detection thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum model confidence before a reading proceeds to
    /// continuous-flow confirmation
    #[serde(default = "defaults::confidence_threshold")]
    pub confidence_threshold: f64,
    /// Trailing window inspected for sustained flow (hours)
    #[serde(default = "defaults::window_hours")]
    pub window_hours: i64,
    /// Minimum readings in the window before the test has enough evidence
    #[serde(default = "defaults::min_window_readings")]
    pub min_window_readings: usize,
    /// Mean flow below this is treated as no-flow (liters/minute)
    #[serde(default = "defaults::min_leak_flow_lpm")]
    pub min_leak_flow_lpm: f64,
    /// Sensitivity knob: flow counts as "basically flat" when its standard
    /// deviation is below this fraction of the mean. Not a physical constant.
    #[serde(default = "defaults::flow_variation_coefficient")]
    pub flow_variation_coefficient: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: defaults::confidence_threshold(),
            window_hours: defaults::window_hours(),
            min_window_readings: defaults::min_window_readings(),
            min_leak_flow_lpm: defaults::min_leak_flow_lpm(),
            flow_variation_coefficient: defaults::flow_variation_coefficient(),
        }
    }
}

/// Alert deduplication policy ("open-leak suppression").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertingConfig {
    /// Do not re-alert for a sensor while it has an unresolved leak record
    /// younger than this many hours.
    #[serde(default = "defaults::cooldown_hours")]
    pub cooldown_hours: i64,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            cooldown_hours: defaults::cooldown_hours(),
        }
    }
}

/// Default values, kept in one place so serde defaults and `Default` impls
/// cannot drift apart.
mod defaults {
    pub fn site_name() -> String {
        "default-site".to_string()
    }
    pub fn data_dir() -> String {
        "./data".to_string()
    }
    pub fn window_days() -> i64 {
        30
    }
    pub fn min_samples() -> usize {
        100
    }
    pub fn num_trees() -> usize {
        100
    }
    pub fn sample_size() -> usize {
        256
    }
    pub fn seed() -> u64 {
        42
    }
    pub fn timeout_secs() -> u64 {
        30
    }
    pub fn score_threshold() -> f64 {
        0.6
    }
    pub fn confidence_threshold() -> f64 {
        0.7
    }
    pub fn window_hours() -> i64 {
        24
    }
    pub fn min_window_readings() -> usize {
        20
    }
    pub fn min_leak_flow_lpm() -> f64 {
        0.5
    }
    pub fn flow_variation_coefficient() -> f64 {
        0.2
    }
    pub fn cooldown_hours() -> i64 {
        24
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_constants() {
        let cfg = SiteConfig::default();
        assert_eq!(cfg.training.window_days, 30);
        assert_eq!(cfg.training.min_samples, 100);
        assert_eq!(cfg.detection.confidence_threshold, 0.7);
        assert_eq!(cfg.detection.window_hours, 24);
        assert_eq!(cfg.detection.min_window_readings, 20);
        assert_eq!(cfg.detection.min_leak_flow_lpm, 0.5);
        assert_eq!(cfg.detection.flow_variation_coefficient, 0.2);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: SiteConfig = toml::from_str(
            r#"
            [site]
            name = "north-district"

            [detection]
            flow_variation_coefficient = 0.15
            "#,
        )
        .unwrap();

        assert_eq!(cfg.site.name, "north-district");
        assert_eq!(cfg.detection.flow_variation_coefficient, 0.15);
        // Untouched sections keep defaults
        assert_eq!(cfg.detection.window_hours, 24);
        assert_eq!(cfg.training.min_samples, 100);
        assert_eq!(cfg.alerting.cooldown_hours, 24);
    }

    #[test]
    fn test_empty_toml_is_fully_defaulted() {
        let cfg: SiteConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.training.num_trees, 100);
        assert_eq!(cfg.training.sample_size, 256);
    }
}

//! Site Configuration Module
//!
//! Provides per-site configuration loaded from TOML files, replacing all
//! hardcoded detection thresholds with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `AQUASENTRY_CONFIG` environment variable (path to TOML file)
//! 2. `site_config.toml` in the current working directory
//! 3. Built-in defaults (matching the original detection constants)
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(SiteConfig::load());
//!
//! // Anywhere in the codebase:
//! let threshold = config::get().detection.confidence_threshold;
//! ```

mod site_config;

pub use site_config::*;

use std::sync::OnceLock;

/// Global site configuration, initialized once at startup.
static SITE_CONFIG: OnceLock<SiteConfig> = OnceLock::new();

/// Initialize the global site configuration.
///
/// Must be called exactly once before any calls to `get()`.
pub fn init(config: SiteConfig) {
    if SITE_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once — ignoring");
    }
}

/// Get a reference to the global site configuration.
///
/// Panics if `init()` has not been called. This is by design — a missing
/// config is a fatal startup error, not a recoverable condition.
pub fn get() -> &'static SiteConfig {
    SITE_CONFIG
        .get()
        .expect("config::get() called before config::init() — this is a startup bug")
}

/// Check whether the config has been initialized.
///
/// Useful for tests and optional config paths.
pub fn is_initialized() -> bool {
    SITE_CONFIG.get().is_some()
}

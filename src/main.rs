//! AquaSentry - Water Distribution Leak Detection
//!
//! Ingests sensor readings, runs the detection pipeline per reading, and
//! persists leak records and alerts.
//!
//! # Usage
//!
//! ```bash
//! # Replay captured telemetry (JSON lines on stdin)
//! cat readings.jsonl | aquasentry --stdin
//!
//! # Run the built-in simulator: normal usage plus one leaking sensor
//! aquasentry --simulate --readings 500 --delay-ms 0
//! ```
//!
//! # Environment Variables
//!
//! - `AQUASENTRY_CONFIG`: Path to site_config.toml
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use aquasentry::config::{self, SiteConfig};
use aquasentry::pipeline::source::{ReadingEvent, ReadingSource, SimulatedSource, StdinSource};
use aquasentry::pipeline::{DetectionPipeline, ReadingDispatcher};
use aquasentry::sensors::SensorRegistry;
use aquasentry::simulate::{SensorSimulator, SimProfile};
use aquasentry::storage::{RecordStore, SledRecordStore, SledTelemetryStore, TelemetryStore};
use aquasentry::types::{Deployment, SensorDevice, SensorType};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "aquasentry")]
#[command(about = "AquaSentry water distribution leak detection")]
#[command(version)]
struct CliArgs {
    /// Read telemetry from stdin (JSON lines, one reading per line)
    #[arg(long)]
    stdin: bool,

    /// Generate synthetic telemetry with the built-in simulator
    #[arg(long)]
    simulate: bool,

    /// Total readings to generate in --simulate mode
    #[arg(long, default_value = "500")]
    readings: usize,

    /// Delay between simulated readings (milliseconds, 0 = no delay)
    #[arg(long, default_value = "50")]
    delay_ms: u64,

    /// Override the data directory from site config
    #[arg(long)]
    data_dir: Option<String>,

    /// Delete existing databases under the data directory before starting
    #[arg(long)]
    reset_db: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    config::init(SiteConfig::load());
    let cfg = config::get();
    info!(site = %cfg.site.name, "AquaSentry starting");

    let data_dir = args.data_dir.clone().unwrap_or_else(|| cfg.site.data_dir.clone());
    if args.reset_db && std::path::Path::new(&data_dir).exists() {
        warn!(data_dir = %data_dir, "Resetting databases");
        std::fs::remove_dir_all(&data_dir)
            .with_context(|| format!("resetting data directory {data_dir}"))?;
    }
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory {data_dir}"))?;

    let telemetry: Arc<dyn TelemetryStore> = Arc::new(
        SledTelemetryStore::open(format!("{data_dir}/telemetry.db"))
            .context("opening telemetry store")?,
    );
    let records = Arc::new(
        SledRecordStore::open(format!("{data_dir}/records.db"))
            .context("opening record store")?,
    );

    let sensors = Arc::new(SensorRegistry::from_devices(demo_sensors()));
    info!(sensors = sensors.len(), "Sensor registry loaded");

    let pipeline = Arc::new(DetectionPipeline::from_config(
        Arc::clone(&telemetry),
        Arc::clone(&records) as Arc<dyn RecordStore>,
        Arc::clone(&sensors),
    ));
    let dispatcher = ReadingDispatcher::new(pipeline);

    let mut source: Box<dyn ReadingSource> = if args.simulate {
        Box::new(SimulatedSource::new(
            demo_simulators(cfg.training.seed),
            args.readings,
            args.delay_ms,
        ))
    } else if args.stdin {
        Box::new(StdinSource::new())
    } else {
        warn!("No source selected; pass --stdin or --simulate");
        return Ok(());
    };

    info!(source = source.source_name(), "Ingest loop starting");
    let mut ingested: u64 = 0;
    loop {
        match source.next_reading().await {
            Ok(ReadingEvent::Reading(reading)) => {
                // Persist first, then analyze off-thread: ingestion never
                // blocks on training or statistics
                if let Err(e) = telemetry.append(&reading).await {
                    warn!(sensor_id = reading.sensor_id, error = %e, "Failed to persist reading");
                    continue;
                }
                dispatcher.dispatch(reading);
                ingested += 1;
            }
            Ok(ReadingEvent::Eof) => break,
            Err(e) => {
                warn!(error = %e, "Reading source failed");
                break;
            }
        }
    }

    info!(ingested, "Source drained, waiting for in-flight analyses");
    dispatcher.shutdown().await;

    let recent = records.recent_alerts(5);
    info!(alerts = recent.len(), "Run summary: most recent alerts");
    for alert in recent {
        info!(
            alert_id = alert.id,
            sensor_id = alert.sensor_id,
            priority = %alert.priority,
            message = %alert.message,
            "Alert"
        );
    }

    info!("AquaSentry stopped");
    Ok(())
}

/// Demo fleet used when no sensor inventory is configured: two municipal
/// trunk sensors, one residential riser, one leaking residential sensor.
fn demo_sensors() -> Vec<SensorDevice> {
    vec![
        SensorDevice::new(1, "FLOW-TRUNK-01", SensorType::Flow, Deployment::Municipal, "North trunk main"),
        SensorDevice::new(2, "FLOW-TRUNK-02", SensorType::Flow, Deployment::Municipal, "East Ridge pumping station"),
        SensorDevice::new(3, "FLOW-RES-01", SensorType::Flow, Deployment::Residential, "Lakeview Society block A"),
        SensorDevice::new(4, "FLOW-RES-02", SensorType::Flow, Deployment::Residential, "Lakeview Society block B"),
    ]
}

fn demo_simulators(seed: u64) -> Vec<SensorSimulator> {
    vec![
        SensorSimulator::new(1, SimProfile::NormalUsage, seed),
        SensorSimulator::new(2, SimProfile::NormalUsage, seed + 1),
        SensorSimulator::new(3, SimProfile::Dropout, seed + 2),
        SensorSimulator::new(4, SimProfile::Leak { rate_lpm: 8.0 }, seed + 3),
    ]
}

//! Reading source abstraction for telemetry ingestion.
//!
//! Provides a unified trait for pulling readings from different sources:
//! stdin (JSON lines, one reading per line) and the built-in simulator.
//! Transport protocols (HTTP, MQTT) belong to the excluded ingestion layer.

use crate::types::Reading;
use anyhow::Result;
use async_trait::async_trait;

/// Events produced by a reading source.
pub enum ReadingEvent {
    /// A valid reading was produced.
    Reading(Reading),
    /// Source reached end of data.
    Eof,
}

/// Trait abstracting where readings come from.
///
/// Implementations handle format parsing and pacing internally. The ingest
/// loop calls [`next_reading`] until `Eof`.
#[async_trait]
pub trait ReadingSource: Send + 'static {
    /// Pull the next reading from the source.
    async fn next_reading(&mut self) -> Result<ReadingEvent>;

    /// Human-readable name for logging (e.g. "stdin", "simulator").
    fn source_name(&self) -> &str;
}

// ============================================================================
// Stdin Source (JSON readings, one per line)
// ============================================================================

/// Reads JSON-formatted readings from stdin.
///
/// Used to pipe captured telemetry through the pipeline:
/// `cat readings.jsonl | aquasentry --stdin`
pub struct StdinSource {
    reader: tokio::io::BufReader<tokio::io::Stdin>,
    line_buffer: String,
}

impl StdinSource {
    pub fn new() -> Self {
        Self {
            reader: tokio::io::BufReader::new(tokio::io::stdin()),
            line_buffer: String::with_capacity(512),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadingSource for StdinSource {
    async fn next_reading(&mut self) -> Result<ReadingEvent> {
        use tokio::io::AsyncBufReadExt;
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_line(&mut self.line_buffer).await?;
            if bytes == 0 {
                return Ok(ReadingEvent::Eof);
            }
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Reading>(line) {
                Ok(reading) => return Ok(ReadingEvent::Reading(reading)),
                Err(e) => {
                    tracing::warn!("[StdinSource] Failed to parse reading: {}", e);
                    // Skip malformed lines and keep reading
                }
            }
        }
    }

    fn source_name(&self) -> &str {
        "stdin"
    }
}

// ============================================================================
// Simulated Source (synthetic sensor traces)
// ============================================================================

/// Produces synthetic readings from one or more sensor simulators, with an
/// optional inter-reading delay.
pub struct SimulatedSource {
    simulators: Vec<crate::simulate::SensorSimulator>,
    next_index: usize,
    remaining: usize,
    delay_ms: u64,
    yielded_first: bool,
}

impl SimulatedSource {
    /// Round-robins over `simulators`, emitting `total` readings in all.
    pub fn new(
        simulators: Vec<crate::simulate::SensorSimulator>,
        total: usize,
        delay_ms: u64,
    ) -> Self {
        Self {
            simulators,
            next_index: 0,
            remaining: total,
            delay_ms,
            yielded_first: false,
        }
    }
}

#[async_trait]
impl ReadingSource for SimulatedSource {
    async fn next_reading(&mut self) -> Result<ReadingEvent> {
        if self.remaining == 0 || self.simulators.is_empty() {
            return Ok(ReadingEvent::Eof);
        }
        if self.yielded_first && self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
        let index = self.next_index;
        self.next_index = (self.next_index + 1) % self.simulators.len();
        self.remaining -= 1;
        self.yielded_first = true;
        let sim = &mut self.simulators[index];
        Ok(ReadingEvent::Reading(sim.next_reading(chrono::Utc::now())))
    }

    fn source_name(&self) -> &str {
        "simulator"
    }
}

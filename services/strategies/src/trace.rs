//! CSV trace output
//!
//! One row per simulated block. Values are written with full `f64` precision
//! so the trace round-trips into analysis tooling.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct BlockRecord<'a> {
    timestamp: &'a str,
    external_price: f64,
    pool_price: f64,
    cumulative_volume: f64,
}

/// Appends one CSV row per block to the configured trace file.
#[derive(Debug)]
pub struct TraceWriter {
    writer: csv::Writer<File>,
}

impl TraceWriter {
    /// Create (or truncate) the trace file. The header row is written with
    /// the first block record.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create trace file {}", path.display()))?;
        Ok(Self { writer })
    }

    pub fn write_block(
        &mut self,
        timestamp: &str,
        external_price: f64,
        pool_price: f64,
        cumulative_volume: f64,
    ) -> Result<()> {
        self.writer
            .serialize(BlockRecord {
                timestamp,
                external_price,
                pool_price,
                cumulative_volume,
            })
            .context("failed to write trace row")
    }

    /// Flush buffered rows to disk.
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush().context("failed to flush trace file")
    }
}

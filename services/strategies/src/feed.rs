//! External price feed ingestion
//!
//! The driver consumes one `(timestamp, price)` tick per simulated second
//! from a CSV file with a `timestamp,price` header. Timestamps are opaque
//! strings passed through to the trace unchanged.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// One tick of the exogenous price series.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PriceTick {
    pub timestamp: String,
    pub price: f64,
}

/// Streaming iterator over a CSV price series.
pub struct PriceFeed {
    records: csv::DeserializeRecordsIntoIter<File, PriceTick>,
}

impl PriceFeed {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open price feed {}", path.display()))?;
        Ok(Self {
            records: reader.into_deserialize(),
        })
    }
}

impl Iterator for PriceFeed {
    type Item = Result<PriceTick>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records
            .next()
            .map(|record| record.context("malformed price feed row"))
    }
}

//! Simulator configuration
//!
//! TOML-file configuration with per-section defaults, plus the path
//! resolution and loading helpers shared by the service binary and tests.
//! A missing config file is not an error: the simulator runs on defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::arbitrage::ArbitrageConfig;
use crate::simulation::BlockCadence;

/// Top-level configuration for one simulator run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub pool: PoolSettings,
    pub arbitrage: ArbitrageConfig,
    pub simulation: SimulationSettings,
    /// Liquidity positions seeded into the pool before the run.
    #[serde(rename = "position")]
    pub positions: Vec<PositionSettings>,
}

/// Pool parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Initial pool price in human units.
    pub first_price: f64,
    /// Proportional pool fee (0.003 = 30 bps).
    pub fee: f64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            first_price: 2000.0,
            fee: 0.003,
        }
    }
}

/// Driver parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Interpret `cadence` as blocks per second instead of seconds per
    /// block.
    pub blocks_per_second: bool,
    /// Block cadence, in the unit selected by `blocks_per_second`.
    pub cadence: u32,
    /// Write a CSV trace row per block.
    pub save_block_info: bool,
    pub trace_file: PathBuf,
    pub feed_file: PathBuf,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            blocks_per_second: false,
            cadence: 12,
            save_block_info: false,
            trace_file: PathBuf::from("trace.csv"),
            feed_file: PathBuf::from("feed.csv"),
        }
    }
}

impl SimulationSettings {
    pub fn block_cadence(&self) -> BlockCadence {
        if self.blocks_per_second {
            BlockCadence::BlocksPerSecond(self.cadence)
        } else {
            BlockCadence::SecondsPerBlock(self.cadence)
        }
    }
}

/// One seeded liquidity position.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PositionSettings {
    pub id: u64,
    /// Token-X amount in human units.
    #[serde(default)]
    pub x: f64,
    /// Token-Y amount in human units.
    #[serde(default)]
    pub y: f64,
    /// Range bounds in human price units, order-insensitive.
    pub lower_price: f64,
    pub upper_price: f64,
}

/// Resolve the configuration file path: environment variable first, then the
/// given default relative path.
pub fn resolve_config_path(env_var: &str, default_relative_path: &str) -> PathBuf {
    if let Ok(path) = std::env::var(env_var) {
        return PathBuf::from(path);
    }
    PathBuf::from(default_relative_path)
}

/// Load a configuration file with proper error handling. A missing file
/// falls back to `default_config`.
pub fn load_config_file<T>(config_path: &Path, default_config: T) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    if !config_path.exists() {
        tracing::info!("config file {:?} not found, using defaults", config_path);
        return Ok(default_config);
    }

    let config_str = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read config file: {:?}", config_path))?;

    let config: T = toml::from_str(&config_str)
        .with_context(|| format!("failed to parse config file: {:?}", config_path))?;

    tracing::info!("loaded configuration from {:?}", config_path);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let config: SimulatorConfig = toml::from_str(
            r#"
            [pool]
            first_price = 2000.0
            fee = 0.003

            [arbitrage]
            min_gas_price = 10.0
            profit_to_gas_ratio = 0.3
            fee_outside = 0.001
            skip = 0.05

            [simulation]
            blocks_per_second = false
            cadence = 12
            save_block_info = true
            trace_file = "out/trace.csv"
            feed_file = "data/feed.csv"

            [[position]]
            id = 1
            x = 1.0
            y = 2000.0
            lower_price = 1500.0
            upper_price = 2500.0
            "#,
        )
        .unwrap();

        assert_eq!(config.pool.first_price, 2000.0);
        assert_eq!(config.arbitrage.skip, 0.05);
        assert!(matches!(
            config.simulation.block_cadence(),
            BlockCadence::SecondsPerBlock(12)
        ));
        assert_eq!(config.positions.len(), 1);
        assert_eq!(config.positions[0].upper_price, 2500.0);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: SimulatorConfig = toml::from_str("").unwrap();

        assert_eq!(config.pool.fee, 0.003);
        assert_eq!(config.arbitrage.fee_outside, 0.001);
        assert!(!config.simulation.save_block_info);
        assert!(config.positions.is_empty());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config_file(
            Path::new("/definitely/not/a/real/config.toml"),
            SimulatorConfig::default(),
        )
        .unwrap();

        assert_eq!(config.pool.first_price, 2000.0);
    }
}

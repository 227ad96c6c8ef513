//! Poolsim trading strategies and simulation driver
//!
//! This crate contains the arbitrage agent that trades against the
//! concentrated-liquidity pool, the block-stepping simulation driver that
//! feeds it external prices, and the service plumbing around them
//! (configuration, price-feed ingestion, CSV trace output, logging).

pub mod arbitrage;
pub mod config;
pub mod feed;
pub mod logging;
pub mod simulation;
pub mod trace;

pub use arbitrage::{Arbitrage, ArbitrageConfig, ArbitrageStats, DealOutcome};
pub use config::SimulatorConfig;
pub use feed::{PriceFeed, PriceTick};
pub use simulation::{BlockCadence, RunSummary, Simulation};
pub use trace::TraceWriter;

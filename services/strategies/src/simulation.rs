//! Block-stepping simulation driver
//!
//! Consumes one external-price tick per simulated second, triggers the
//! arbitrage agent once per block, and emits the per-block trace. The driver
//! owns the pool and the agent; all stepping is synchronous.

use std::collections::BTreeMap;

use anyhow::{ensure, Result};
use serde::Serialize;
use tracing::info;

use poolsim_amm::{FeePolicy, FlatFee, Pool, Position};

use crate::arbitrage::{Arbitrage, ArbitrageStats};
use crate::config::SimulatorConfig;
use crate::trace::TraceWriter;

/// How simulated seconds map to blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockCadence {
    /// One block every `n` one-second ticks.
    SecondsPerBlock(u32),
    /// `n` blocks on every one-second tick.
    BlocksPerSecond(u32),
}

/// End-of-run summary: final pool state, agent statistics, and every
/// surviving position keyed by id (sorted for stable output).
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub blocks: u64,
    pub final_pool_price: f64,
    pub arbitrage: ArbitrageStats,
    pub positions: BTreeMap<u64, Position>,
}

/// The simulation engine.
pub struct Simulation<P: FeePolicy = FlatFee> {
    pool: Pool<P>,
    arbitrage: Arbitrage,
    cadence: BlockCadence,
    counter: u32,
    current_block: u64,
    trace: Option<TraceWriter>,
}

impl Simulation<FlatFee> {
    /// Build a simulation from a full configuration: pool, seeded positions,
    /// agent, cadence, and (optionally) the trace writer.
    pub fn from_config(config: &SimulatorConfig) -> Result<Self> {
        ensure!(config.simulation.cadence >= 1, "block cadence must be at least 1");

        let mut pool = Pool::new(config.pool.first_price, config.pool.fee);
        for position in &config.positions {
            pool.add_liquidity(
                position.id,
                position.x,
                position.y,
                position.lower_price,
                position.upper_price,
            );
        }

        let mut simulation = Self::new(
            pool,
            Arbitrage::new(config.arbitrage),
            config.simulation.block_cadence(),
        );

        if config.simulation.save_block_info {
            simulation.enable_trace(TraceWriter::create(&config.simulation.trace_file)?);
        }

        Ok(simulation)
    }
}

impl<P: FeePolicy> Simulation<P> {
    pub fn new(pool: Pool<P>, arbitrage: Arbitrage, cadence: BlockCadence) -> Self {
        info!(?cadence, "simulation initialized");
        let counter = match cadence {
            // Start one tick short of a block so the first tick produces one.
            BlockCadence::SecondsPerBlock(n) => n.saturating_sub(1),
            BlockCadence::BlocksPerSecond(_) => 0,
        };
        Self {
            pool,
            arbitrage,
            cadence,
            counter,
            current_block: 0,
            trace: None,
        }
    }

    /// Attach a trace writer; one row is appended per block from now on.
    pub fn enable_trace(&mut self, trace: TraceWriter) {
        self.trace = Some(trace);
    }

    pub fn pool(&self) -> &Pool<P> {
        &self.pool
    }

    pub fn arbitrage(&self) -> &Arbitrage {
        &self.arbitrage
    }

    /// Blocks produced so far.
    pub fn current_block(&self) -> u64 {
        self.current_block
    }

    /// Advance the simulation by one second of feed time.
    pub fn step_second(&mut self, timestamp: &str, outside_price: f64) -> Result<()> {
        match self.cadence {
            BlockCadence::SecondsPerBlock(seconds_per_block) => {
                self.counter += 1;
                if self.counter >= seconds_per_block {
                    self.advance_block(timestamp, outside_price)?;
                    self.counter = 0;
                }
            }
            BlockCadence::BlocksPerSecond(blocks) => {
                for _ in 0..blocks {
                    self.advance_block(timestamp, outside_price)?;
                }
            }
        }
        Ok(())
    }

    fn advance_block(&mut self, timestamp: &str, outside_price: f64) -> Result<()> {
        self.current_block += 1;
        self.arbitrage.deal(&mut self.pool, outside_price);

        if let Some(trace) = &mut self.trace {
            trace.write_block(
                timestamp,
                outside_price,
                self.pool.current_price,
                self.arbitrage.stats().cumulative_volume,
            )?;
        }
        Ok(())
    }

    /// Flush the trace and return the end-of-run summary.
    pub fn finish(self) -> Result<RunSummary> {
        if let Some(trace) = self.trace {
            trace.finish()?;
        }

        let positions: BTreeMap<u64, Position> = self
            .pool
            .positions()
            .iter()
            .map(|(&id, position)| (id, position.clone()))
            .collect();

        info!(
            blocks = self.current_block,
            deals = self.arbitrage.stats().num_deals,
            final_pool_price = self.pool.current_price,
            "simulation finished"
        );

        Ok(RunSummary {
            blocks: self.current_block,
            final_pool_price: self.pool.current_price,
            arbitrage: *self.arbitrage.stats(),
            positions,
        })
    }
}

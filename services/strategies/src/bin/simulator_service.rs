//! Pool Simulator Service Entry Point

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use poolsim_strategies::config::{load_config_file, resolve_config_path, SimulatorConfig};
use poolsim_strategies::feed::PriceFeed;
use poolsim_strategies::logging::init_simulator_logging;
use poolsim_strategies::simulation::Simulation;

fn main() -> Result<()> {
    init_simulator_logging()?;

    info!("🚀 Starting pool simulator service...");

    // Config path: CLI argument, then SIMULATOR_CONFIG, then the default.
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| resolve_config_path("SIMULATOR_CONFIG", "simulator.toml"));

    let config: SimulatorConfig = load_config_file(&config_path, SimulatorConfig::default())?;

    let mut simulation = Simulation::from_config(&config)?;
    info!("✅ Pool and arbitrage agent initialized");

    let feed = PriceFeed::open(&config.simulation.feed_file)?;
    info!(feed = %config.simulation.feed_file.display(), "📡 Consuming price feed");

    for tick in feed {
        let tick = tick?;
        simulation.step_second(&tick.timestamp, tick.price)?;
    }

    let summary = simulation.finish()?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

//! Driver behavior: block cadence, trace emission, feed ingestion

use std::path::PathBuf;

use poolsim_amm::Pool;
use poolsim_strategies::arbitrage::{Arbitrage, ArbitrageConfig};
use poolsim_strategies::config::{PositionSettings, SimulatorConfig};
use poolsim_strategies::feed::{PriceFeed, PriceTick};
use poolsim_strategies::simulation::{BlockCadence, Simulation};
use poolsim_strategies::trace::TraceWriter;
use test_case::test_case;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("poolsim_{}_{}", std::process::id(), name))
}

fn liquid_pool() -> Pool {
    let mut pool = Pool::new(2000.0, 0.003);
    pool.add_liquidity(1, 10.0, 20_000.0, 1500.0, 2500.0);
    pool
}

fn quiet_agent() -> Arbitrage {
    Arbitrage::new(ArbitrageConfig {
        min_gas_price: f64::INFINITY,
        skip: 0.0,
        ..ArbitrageConfig::default()
    })
}

#[test_case(BlockCadence::SecondsPerBlock(1), 10 => 10; "every_second")]
#[test_case(BlockCadence::SecondsPerBlock(5), 10 => 2; "every_five_seconds")]
#[test_case(BlockCadence::SecondsPerBlock(12), 10 => 1; "first_tick_opens_a_block")]
#[test_case(BlockCadence::BlocksPerSecond(3), 2 => 6; "multiple_blocks_per_second")]
fn cadence_controls_block_count(cadence: BlockCadence, ticks: u32) -> u64 {
    let mut simulation = Simulation::new(liquid_pool(), quiet_agent(), cadence);

    for i in 0..ticks {
        simulation
            .step_second(&format!("t{i}"), 2000.0 + i as f64)
            .unwrap();
    }

    simulation.current_block()
}

#[test]
fn trace_contains_one_row_per_block() {
    let trace_path = temp_path("trace_rows.csv");
    let mut simulation = Simulation::new(
        liquid_pool(),
        quiet_agent(),
        BlockCadence::SecondsPerBlock(2),
    );
    simulation.enable_trace(TraceWriter::create(&trace_path).unwrap());

    for i in 0..6 {
        simulation
            .step_second(&format!("t{i}"), 2000.0 + i as f64)
            .unwrap();
    }

    let summary = simulation.finish().unwrap();
    assert_eq!(summary.blocks, 3);

    let mut reader = csv::Reader::from_path(&trace_path).unwrap();
    assert_eq!(
        reader.headers().unwrap(),
        &csv::StringRecord::from(vec![
            "timestamp",
            "external_price",
            "pool_price",
            "cumulative_volume"
        ])
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);

    // Numeric fields round-trip through the trace.
    let pool_price: f64 = rows[0][2].parse().unwrap();
    assert_eq!(pool_price, 2000.0);

    std::fs::remove_file(&trace_path).ok();
}

#[test]
fn executed_deals_show_up_in_the_trace_volume() {
    let trace_path = temp_path("trace_volume.csv");
    let mut simulation = Simulation::new(
        liquid_pool(),
        Arbitrage::new(ArbitrageConfig {
            min_gas_price: 0.1,
            skip: 0.0,
            ..ArbitrageConfig::default()
        }),
        BlockCadence::SecondsPerBlock(1),
    );
    simulation.enable_trace(TraceWriter::create(&trace_path).unwrap());

    // A large deviation forces a deal on the first block.
    simulation.step_second("t0", 2200.0).unwrap();
    let summary = simulation.finish().unwrap();

    assert_eq!(summary.arbitrage.num_deals, 1);
    assert!(summary.final_pool_price > 2000.0);

    let mut reader = csv::Reader::from_path(&trace_path).unwrap();
    let row = reader.records().next().unwrap().unwrap();
    let cumulative_volume: f64 = row[3].parse().unwrap();
    assert!(cumulative_volume > 0.0);

    std::fs::remove_file(&trace_path).ok();
}

#[test]
fn feed_parses_ticks_in_order() {
    let feed_path = temp_path("feed.csv");
    std::fs::write(
        &feed_path,
        "timestamp,price\n2024-01-01T00:00:00,2000.5\n2024-01-01T00:00:01,2001.25\n",
    )
    .unwrap();

    let ticks: Vec<PriceTick> = PriceFeed::open(&feed_path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        ticks,
        vec![
            PriceTick {
                timestamp: "2024-01-01T00:00:00".to_string(),
                price: 2000.5
            },
            PriceTick {
                timestamp: "2024-01-01T00:00:01".to_string(),
                price: 2001.25
            },
        ]
    );

    std::fs::remove_file(&feed_path).ok();
}

#[test]
fn feed_reports_malformed_rows() {
    let feed_path = temp_path("feed_bad.csv");
    std::fs::write(&feed_path, "timestamp,price\nt0,not-a-number\n").unwrap();

    let mut feed = PriceFeed::open(&feed_path).unwrap();
    assert!(feed.next().unwrap().is_err());

    std::fs::remove_file(&feed_path).ok();
}

#[test]
fn from_config_seeds_positions_and_traces() {
    let trace_path = temp_path("from_config_trace.csv");

    let mut config = SimulatorConfig::default();
    config.pool.first_price = 2000.0;
    config.simulation.cadence = 1;
    config.simulation.save_block_info = true;
    config.simulation.trace_file = trace_path.clone();
    config.arbitrage.min_gas_price = 0.1;
    config.positions.push(PositionSettings {
        id: 1,
        x: 10.0,
        y: 20_000.0,
        lower_price: 1500.0,
        upper_price: 2500.0,
    });

    let mut simulation = Simulation::from_config(&config).unwrap();
    assert!(simulation.pool().position(1).is_some());

    simulation.step_second("t0", 2100.0).unwrap();
    let summary = simulation.finish().unwrap();

    assert_eq!(summary.blocks, 1);
    assert_eq!(summary.arbitrage.num_deals, 1);
    assert!(summary.positions.contains_key(&1));
    assert!(trace_path.exists());

    std::fs::remove_file(&trace_path).ok();
}

#[test]
fn zero_cadence_is_rejected() {
    let mut config = SimulatorConfig::default();
    config.simulation.cadence = 0;

    assert!(Simulation::from_config(&config).is_err());
}

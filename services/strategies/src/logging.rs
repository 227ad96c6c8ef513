//! Logging configuration for the simulator service

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialize standardized logging for the simulator service.
pub fn init_simulator_logging() -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("info".parse()?)
        .add_directive("poolsim_strategies=info".parse()?)
        .add_directive("poolsim_amm=info".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    Ok(())
}

/// Initialize logging for testing with debug level.
pub fn init_test_logging() {
    let filter = EnvFilter::from_default_env()
        .add_directive("debug".parse().expect("static directive"))
        .add_directive(
            "poolsim_strategies=debug"
                .parse()
                .expect("static directive"),
        );

    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

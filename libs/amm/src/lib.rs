//! Concentrated-liquidity pool engine
//!
//! Simulates a range-based constant-product pool: liquidity positions that
//! span square-root-price ranges, swaps that walk the price across range
//! boundaries in sub-steps, and proportional output/fee distribution to the
//! positions active on each sub-step.
//!
//! All square-root prices are `f64` values scaled by [`constants::Q96`]; all
//! token amounts are `f64` values scaled by [`constants::TOKEN_SCALE`]. The
//! precision envelope is that of IEEE-754 double arithmetic (~2^-52 relative
//! error per operation); callers comparing results should use a small
//! relative epsilon.

pub mod constants;
pub mod error;
pub mod pool;
pub mod position;
pub mod sqrt_price;

pub use error::{PoolError, SwapError};
pub use pool::{FeePolicy, FlatFee, Pool, RangeScan, SwapDirection, SwapExecution};
pub use position::Position;

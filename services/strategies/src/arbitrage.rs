//! Arbitrage agent
//!
//! Closes the gap between the pool price and an external venue's price.
//! Each block the agent computes the no-trade band implied by both venues'
//! fees, inverts the pool's swap curve to find the trade that lands exactly
//! on the post-fee external-equivalent price, and executes it when the
//! profit left after the modeled gas burn clears the configured floor.
//!
//! The curve inversion ([`Arbitrage::optimize_trade`]) walks the same range
//! structure as the swap engine, forwards, without mutating pool state: the
//! `(1+fee)` factor it applies to the input leg is the exact inverse of the
//! swap engine's `(1+fee)` divisor, and the two must stay consistent.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use poolsim_amm::constants::{Q96, TOKEN_SCALE};
use poolsim_amm::sqrt_price::price_to_sqrt_price;
use poolsim_amm::{FeePolicy, Pool, SwapDirection};

/// Upper bound on optimizer walk sub-steps before the target price is
/// declared unreachable.
const MAX_WALK_STEPS: usize = 256;

/// Agent parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ArbitrageConfig {
    /// Minimum burned profit (in token Y) required to execute a deal.
    pub min_gas_price: f64,
    /// Fraction of gross profit modeled as consumed by gas, in `[0, 1]`.
    pub profit_to_gas_ratio: f64,
    /// Proportional fee charged by the external venue.
    pub fee_outside: f64,
    /// Bernoulli probability of skipping a block entirely, in `[0, 1]`.
    pub skip: f64,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            min_gas_price: 5.0,
            profit_to_gas_ratio: 0.3,
            fee_outside: 0.001,
            skip: 0.0,
        }
    }
}

/// Cumulative agent statistics. Profit, volume and burn are denominated in
/// token Y.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ArbitrageStats {
    pub cumulative_profit: f64,
    pub cumulative_volume: f64,
    pub cumulative_burn: f64,
    pub num_deals: u64,
}

/// Outcome of one [`Arbitrage::deal`] invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DealOutcome {
    /// A swap was committed and stats were updated.
    Executed { profit: f64, volume: f64, burned: f64 },
    /// The Bernoulli skip roll fired; nothing was evaluated.
    Skipped,
    /// Neither the pool price nor the external price moved since the last
    /// evaluation.
    NoPriceChange,
    /// The external price sits inside the no-trade band.
    WithinBand,
    /// Gross profit exists but the burned share is below the gas floor.
    BelowGasFloor,
    /// The optimizer could not produce a trade for the target price.
    Infeasible,
    /// The pool rejected the committed swap; stats were left untouched.
    SwapRejected,
}

/// The arbitrage agent. Holds no pool reference: the pool is passed into
/// [`Arbitrage::deal`] by the driver that owns both.
#[derive(Debug, Clone)]
pub struct Arbitrage {
    config: ArbitrageConfig,
    stats: ArbitrageStats,
    last_pool_price: Option<f64>,
    last_outside_price: Option<f64>,
}

impl Arbitrage {
    pub fn new(config: ArbitrageConfig) -> Self {
        Self {
            config,
            stats: ArbitrageStats::default(),
            last_pool_price: None,
            last_outside_price: None,
        }
    }

    /// Cumulative statistics over all executed deals.
    pub fn stats(&self) -> &ArbitrageStats {
        &self.stats
    }

    /// Evaluate one block against `outside_price` and trade if profitable.
    pub fn deal<P: FeePolicy>(&mut self, pool: &mut Pool<P>, outside_price: f64) -> DealOutcome {
        if rand::random::<f64>() < self.config.skip {
            return DealOutcome::Skipped;
        }

        let pool_price = pool.current_price;
        let fee = pool.fee;

        let band_low = pool_price * (1.0 - fee - self.config.fee_outside);
        let band_high = pool_price * (1.0 + fee + self.config.fee_outside);

        if self.last_pool_price == Some(pool_price) && self.last_outside_price == Some(outside_price)
        {
            info!("no price change since last block, skipping deal");
            return DealOutcome::NoPriceChange;
        }
        self.last_pool_price = Some(pool_price);
        self.last_outside_price = Some(outside_price);

        info!(
            band_low,
            band_high, pool_price, outside_price, "evaluating arbitrage"
        );

        if outside_price < band_low {
            // Pool is overpriced: buy Y from the pool, sell it outside.
            let ideal_price = outside_price / (1.0 - fee - self.config.fee_outside);
            let Some((x_in, y_out)) =
                self.optimize_trade(pool, ideal_price, SwapDirection::ZeroForOne)
            else {
                return DealOutcome::Infeasible;
            };

            // `y_out` is negative (received from the pool); selling it
            // outside returns X, and the profit is priced back into Y.
            let x_return = -y_out / outside_price * (1.0 - self.config.fee_outside);
            let gross_profit = (x_return - x_in) * outside_price;

            self.settle(pool, x_in, SwapDirection::ZeroForOne, gross_profit, x_in * pool_price)
        } else if outside_price > band_high {
            // Pool is underpriced: buy X from the pool, sell it outside.
            let ideal_price = outside_price / (1.0 + fee + self.config.fee_outside);
            let Some((y_in, x_out)) =
                self.optimize_trade(pool, ideal_price, SwapDirection::OneForZero)
            else {
                return DealOutcome::Infeasible;
            };

            let y_return = -x_out * outside_price * (1.0 - self.config.fee_outside);
            let gross_profit = y_return - y_in;

            self.settle(pool, y_in, SwapDirection::OneForZero, gross_profit, y_in)
        } else {
            info!("external price within no-trade band");
            DealOutcome::WithinBand
        }
    }

    /// Gate on the gas floor, commit the swap, and update stats.
    fn settle<P: FeePolicy>(
        &mut self,
        pool: &mut Pool<P>,
        amount_in: f64,
        direction: SwapDirection,
        gross_profit: f64,
        volume: f64,
    ) -> DealOutcome {
        let real_profit = gross_profit * (1.0 - self.config.profit_to_gas_ratio);
        let burned_profit = gross_profit * self.config.profit_to_gas_ratio;

        info!(
            amount_in,
            ?direction,
            gross_profit,
            real_profit,
            "arbitrage opportunity sized"
        );

        if burned_profit < self.config.min_gas_price {
            info!(
                burned_profit,
                min_gas_price = self.config.min_gas_price,
                "burned profit below gas floor"
            );
            return DealOutcome::BelowGasFloor;
        }

        match pool.swap(amount_in, direction, false) {
            Ok(_) => {
                self.stats.cumulative_profit += real_profit;
                self.stats.cumulative_volume += volume;
                self.stats.cumulative_burn += burned_profit;
                self.stats.num_deals += 1;
                DealOutcome::Executed {
                    profit: real_profit,
                    volume,
                    burned: burned_profit,
                }
            }
            Err(e) => {
                warn!(error = %e, "arbitrage swap rejected by pool");
                DealOutcome::SwapRejected
            }
        }
    }

    /// Invert the swap curve: the `(input, output)` amounts, in human units,
    /// that move the pool exactly to `ideal_price` when swapped in
    /// `direction`. Output uses the pool's sign convention (negative leaves
    /// the pool).
    ///
    /// Returns `None` when the pool already sits at the target price or the
    /// walk fails to converge.
    pub fn optimize_trade<P: FeePolicy>(
        &self,
        pool: &Pool<P>,
        ideal_price: f64,
        direction: SwapDirection,
    ) -> Option<(f64, f64)> {
        let ideal_sqrt_price = price_to_sqrt_price(ideal_price);
        let fee = pool.fee;
        let mut cursor = pool.sqrt_price;
        let mut x_sum = 0.0;
        let mut y_sum = 0.0;

        let mut steps = 0;
        while cursor != ideal_sqrt_price {
            steps += 1;
            if steps > MAX_WALK_STEPS {
                warn!(ideal_price, "optimizer walk failed to converge");
                return None;
            }

            let scan = pool.scan_ranges(cursor, direction);

            match direction {
                SwapDirection::ZeroForOne => {
                    if scan.nearest_boundary <= ideal_sqrt_price {
                        // The target lies within the current range.
                        let y_delta = (ideal_sqrt_price - cursor) * scan.total_liquidity / Q96;
                        let x_delta = (1.0 / ideal_sqrt_price - 1.0 / cursor)
                            * scan.total_liquidity
                            * (1.0 + fee)
                            * Q96;
                        return Some((
                            (x_sum + x_delta) / TOKEN_SCALE,
                            (y_sum + y_delta) / TOKEN_SCALE,
                        ));
                    }
                    let y_delta = (scan.nearest_boundary - cursor) * scan.total_liquidity / Q96;
                    let x_delta = (1.0 / scan.nearest_boundary - 1.0 / cursor)
                        * scan.total_liquidity
                        * (1.0 + fee)
                        * Q96;
                    y_sum += y_delta;
                    x_sum += x_delta;
                    cursor = scan.nearest_boundary;
                }
                SwapDirection::OneForZero => {
                    if scan.nearest_boundary >= ideal_sqrt_price {
                        let y_delta = (ideal_sqrt_price - cursor)
                            * scan.total_liquidity
                            * (1.0 + fee)
                            / Q96;
                        let x_delta =
                            (1.0 / ideal_sqrt_price - 1.0 / cursor) * scan.total_liquidity * Q96;
                        return Some((
                            (y_sum + y_delta) / TOKEN_SCALE,
                            (x_sum + x_delta) / TOKEN_SCALE,
                        ));
                    }
                    let y_delta =
                        (scan.nearest_boundary - cursor) * scan.total_liquidity * (1.0 + fee) / Q96;
                    let x_delta =
                        (1.0 / scan.nearest_boundary - 1.0 / cursor) * scan.total_liquidity * Q96;
                    y_sum += y_delta;
                    x_sum += x_delta;
                    cursor = scan.nearest_boundary;
                }
            }
        }

        None
    }
}

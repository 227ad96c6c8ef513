//! Pool state and the swap engine
//!
//! The pool owns the position map and the current price. A swap walks the
//! square-root price in sub-steps bounded by the nearest initialized range
//! endpoint: within a range the constant-product closed form applies
//! directly; at a boundary the step is capped, positions are credited, and
//! the active set is recomputed. A deep pre-swap snapshot backs both the
//! simulate mode and the insufficient-liquidity rollback.

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::constants::{MAX_SQRT_PRICE, Q96, TOKEN_SCALE};
use crate::error::{PoolError, SwapError};
use crate::position::Position;
use crate::sqrt_price::{
    liquidity_from_x, liquidity_from_y, price_to_sqrt_price, sqrt_price_to_price,
};

/// Swap direction, named for which token is paid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
    /// Pay token X, receive token Y; the price falls.
    ZeroForOne,
    /// Pay token Y, receive token X; the price rises.
    OneForZero,
}

/// Successful swap result.
///
/// `amount_out` is the cumulative output-leg delta in token-scaled units,
/// using the pool's sign convention: amounts leaving the pool are negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwapExecution {
    /// The swap was applied to pool state.
    Committed { amount_out: f64, sqrt_price: f64 },
    /// The swap was evaluated and rolled back; pool state is unchanged.
    Simulated { amount_out: f64, sqrt_price: f64 },
}

impl SwapExecution {
    /// Output-leg delta regardless of commit mode.
    pub fn amount_out(&self) -> f64 {
        match *self {
            SwapExecution::Committed { amount_out, .. }
            | SwapExecution::Simulated { amount_out, .. } => amount_out,
        }
    }

    /// Final square-root price regardless of commit mode.
    pub fn sqrt_price(&self) -> f64 {
        match *self {
            SwapExecution::Committed { sqrt_price, .. }
            | SwapExecution::Simulated { sqrt_price, .. } => sqrt_price,
        }
    }
}

/// Result of one range scan: the nearest initialized boundary in the scan
/// direction, the ids of positions active at the scan price, and their
/// combined liquidity.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeScan {
    /// Nearest range endpoint strictly past the scan price in the scan
    /// direction; `0` (downward) or [`MAX_SQRT_PRICE`] (upward) when no
    /// endpoint qualifies.
    pub nearest_boundary: f64,
    /// Ids of active positions, sorted for deterministic accounting order.
    pub active_ids: Vec<u64>,
    /// Sum of `L` over the active positions.
    pub total_liquidity: f64,
}

/// Extension point for dynamic-fee research.
///
/// Both hooks default to identities: the effective fee is the configured fee
/// and no post-swap bookkeeping happens. Implementations see the amount and
/// direction of every swap routed through the pool.
pub trait FeePolicy {
    /// Effective proportional fee for the upcoming swap.
    fn fee_before_swap(&mut self, current_fee: f64, amount: f64, direction: SwapDirection) -> f64 {
        let _ = (amount, direction);
        current_fee
    }

    /// Post-swap bookkeeping, invoked only on committed swaps.
    fn fee_after_swap(&mut self, amount: f64, direction: SwapDirection) {
        let _ = (amount, direction);
    }
}

/// The identity fee policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlatFee;

impl FeePolicy for FlatFee {}

/// Pre-swap state captured for rollback. Covers every field step accounting
/// mutates: the full position map plus the scalar price pair.
#[derive(Debug, Clone)]
struct PoolSnapshot {
    positions: HashMap<u64, Position>,
    current_price: f64,
    sqrt_price: f64,
}

/// A concentrated-liquidity pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Pool<P: FeePolicy = FlatFee> {
    /// Price the pool was initialized at.
    pub first_price: f64,
    /// Current human-unit price, derived from `sqrt_price`.
    pub current_price: f64,
    /// Current Q96-scaled square-root price.
    pub sqrt_price: f64,
    /// Configured proportional fee (0.003 = 30 bps).
    pub fee: f64,
    /// Effective fee of the most recent swap, as decided by the fee policy.
    pub last_fee: f64,
    positions: HashMap<u64, Position>,
    fee_policy: P,
}

impl Pool<FlatFee> {
    /// Create a pool at `first_price` with a flat proportional fee.
    pub fn new(first_price: f64, fee: f64) -> Self {
        Self::with_fee_policy(first_price, fee, FlatFee)
    }
}

impl<P: FeePolicy> Pool<P> {
    /// Create a pool with a custom fee policy.
    pub fn with_fee_policy(first_price: f64, fee: f64, fee_policy: P) -> Self {
        info!(first_price, fee, "pool initialized");
        Self {
            first_price,
            current_price: first_price,
            sqrt_price: price_to_sqrt_price(first_price),
            fee,
            last_fee: 0.0,
            positions: HashMap::new(),
            fee_policy,
        }
    }

    /// The position stored under `id`, if any.
    pub fn position(&self, id: u64) -> Option<&Position> {
        self.positions.get(&id)
    }

    /// All positions, keyed by id. Iteration order is unspecified.
    pub fn positions(&self) -> &HashMap<u64, Position> {
        &self.positions
    }

    /// Sum of `L` over positions whose range contains the current price
    /// (closed on both ends). Recomputed on demand.
    pub fn current_liquidity(&self) -> f64 {
        self.positions
            .values()
            .filter(|p| p.lower_sqrt_price <= self.sqrt_price && self.sqrt_price <= p.upper_sqrt_price)
            .map(|p| p.liquidity)
            .sum()
    }

    /// Add a liquidity position.
    ///
    /// `x` and `y` are token amounts in human units, `pa` and `pb` price
    /// bounds in human units (order-insensitive). The position's `L` depends
    /// on where the current price sits relative to the range: inside it, the
    /// binding side of `min(L_x, L_y)` (floor-truncated); outside it, the
    /// single-token formula for the side the range is on. Re-adding an
    /// existing id replaces the position.
    pub fn add_liquidity(&mut self, id: u64, x: f64, y: f64, pa: f64, pb: f64) {
        let x = x * TOKEN_SCALE;
        let y = y * TOKEN_SCALE;
        let mut pa = price_to_sqrt_price(pa);
        let mut pb = price_to_sqrt_price(pb);
        if pa > pb {
            std::mem::swap(&mut pa, &mut pb);
        }

        let liquidity = if pa < self.sqrt_price && self.sqrt_price < pb {
            let liq_x = liquidity_from_x(x, pb, self.sqrt_price);
            let liq_y = liquidity_from_y(y, self.sqrt_price, pa);
            liq_x.min(liq_y).floor()
        } else if self.sqrt_price <= pa {
            liquidity_from_x(x, pb, pa)
        } else {
            liquidity_from_y(y, pb, pa)
        };

        let position = Position {
            lower_sqrt_price: pa,
            upper_sqrt_price: pb,
            liquidity,
            x_real: x,
            y_real: y,
            fee_x: 0.0,
            fee_y: 0.0,
            fee_in_y: 0.0,
            first_price: self.current_price,
            x_real_start: x / TOKEN_SCALE,
            y_real_start: y / TOKEN_SCALE,
        };

        info!(id, liquidity = position.liquidity, "added liquidity position");
        self.positions.insert(id, position);
    }

    /// Remove and return the position under `id`.
    pub fn burn_liquidity(&mut self, id: u64) -> Result<Position, PoolError> {
        match self.positions.remove(&id) {
            Some(position) => {
                info!(id, "burned liquidity position");
                Ok(position)
            }
            None => {
                error!(id, "tried to remove non-existent liquidity position");
                Err(PoolError::PositionNotFound { id })
            }
        }
    }

    /// Execute or simulate a swap of `amount` (human units) of the input
    /// token for the given direction.
    ///
    /// With `simulate` the pool is rolled back to its pre-swap state and the
    /// would-be output and final price are returned. On any error the pool
    /// state is unchanged.
    pub fn swap(
        &mut self,
        amount: f64,
        direction: SwapDirection,
        simulate: bool,
    ) -> Result<SwapExecution, SwapError> {
        debug!(amount, ?direction, simulate, "starting swap");

        let saved_fee = self.fee;
        self.fee = self.fee_policy.fee_before_swap(saved_fee, amount, direction);
        self.last_fee = self.fee;

        let result = match direction {
            SwapDirection::ZeroForOne => self.swap_x_for_y(amount, simulate),
            SwapDirection::OneForZero => self.swap_y_for_x(amount, simulate),
        };

        if result.is_ok() && !simulate {
            self.fee_policy.fee_after_swap(amount, direction);
        }
        self.fee = saved_fee;
        result
    }

    fn swap_x_for_y(&mut self, amount: f64, simulate: bool) -> Result<SwapExecution, SwapError> {
        let mut x_remaining = amount * TOKEN_SCALE;
        if x_remaining == 0.0 {
            warn!("zero-size swap rejected");
            return Err(SwapError::ZeroAmount);
        }

        let snapshot = self.snapshot();
        let mut scan = self.scan_ranges(self.sqrt_price, SwapDirection::ZeroForOne);
        let mut y_out = 0.0;
        let mut final_sqrt_price = self.sqrt_price;

        while x_remaining != 0.0 {
            if scan.total_liquidity == 0.0 {
                info!("no active liquidity, reverting swap");
                self.restore(snapshot);
                return Err(SwapError::InsufficientLiquidity);
            }

            // Candidate price assuming the whole remaining input fits in the
            // current range: 1/s' = 1/s + dx / ((1+fee) * L * Q96).
            let inv_delta = x_remaining / (1.0 + self.fee) / scan.total_liquidity / Q96;
            let candidate = 1.0 / (1.0 / self.sqrt_price + inv_delta);

            if candidate > scan.nearest_boundary {
                // Final sub-step, contained in the current range.
                let y_delta = (candidate - self.sqrt_price) * scan.total_liquidity / Q96;
                self.apply_step(
                    x_remaining,
                    y_delta,
                    scan.total_liquidity,
                    candidate,
                    &scan.active_ids,
                    SwapDirection::ZeroForOne,
                );
                final_sqrt_price = candidate;
                y_out += y_delta;
                x_remaining = 0.0;
            } else {
                // Cap the sub-step at the boundary, then rescan with the new
                // active set.
                let x_delta = scan.total_liquidity
                    * (1.0 / scan.nearest_boundary - 1.0 / self.sqrt_price)
                    * (1.0 + self.fee)
                    * Q96;
                let y_delta =
                    (scan.nearest_boundary - self.sqrt_price) * scan.total_liquidity / Q96;
                self.apply_step(
                    x_delta,
                    y_delta,
                    scan.total_liquidity,
                    scan.nearest_boundary,
                    &scan.active_ids,
                    SwapDirection::ZeroForOne,
                );
                final_sqrt_price = scan.nearest_boundary;
                y_out += y_delta;
                x_remaining -= x_delta;
                scan = self.scan_ranges(self.sqrt_price, SwapDirection::ZeroForOne);
            }
        }

        if simulate {
            self.restore(snapshot);
            Ok(SwapExecution::Simulated {
                amount_out: y_out,
                sqrt_price: final_sqrt_price,
            })
        } else {
            info!(
                amount_in = amount,
                amount_out = y_out / TOKEN_SCALE,
                price = self.current_price,
                "swap committed: x -> y"
            );
            Ok(SwapExecution::Committed {
                amount_out: y_out,
                sqrt_price: self.sqrt_price,
            })
        }
    }

    fn swap_y_for_x(&mut self, amount: f64, simulate: bool) -> Result<SwapExecution, SwapError> {
        let mut y_remaining = amount * TOKEN_SCALE;
        if y_remaining == 0.0 {
            warn!("zero-size swap rejected");
            return Err(SwapError::ZeroAmount);
        }

        let snapshot = self.snapshot();
        let mut scan = self.scan_ranges(self.sqrt_price, SwapDirection::OneForZero);
        let mut x_out = 0.0;
        let mut final_sqrt_price = self.sqrt_price;

        while y_remaining != 0.0 {
            if scan.total_liquidity == 0.0 {
                info!("no active liquidity, reverting swap");
                self.restore(snapshot);
                return Err(SwapError::InsufficientLiquidity);
            }

            // Candidate price assuming the whole remaining input fits in the
            // current range: s' = s + dy * Q96 / ((1+fee) * L).
            let delta = y_remaining / (1.0 + self.fee) / scan.total_liquidity * Q96;
            let candidate = self.sqrt_price + delta;

            if candidate < scan.nearest_boundary {
                let x_delta =
                    (1.0 / candidate - 1.0 / self.sqrt_price) * scan.total_liquidity * Q96;
                self.apply_step(
                    x_delta,
                    y_remaining,
                    scan.total_liquidity,
                    candidate,
                    &scan.active_ids,
                    SwapDirection::OneForZero,
                );
                final_sqrt_price = candidate;
                x_out += x_delta;
                y_remaining = 0.0;
            } else {
                let y_delta = scan.total_liquidity
                    * (scan.nearest_boundary - self.sqrt_price)
                    / Q96
                    * (1.0 + self.fee);
                let x_delta = (1.0 / scan.nearest_boundary - 1.0 / self.sqrt_price)
                    * scan.total_liquidity
                    * Q96;
                self.apply_step(
                    x_delta,
                    y_delta,
                    scan.total_liquidity,
                    scan.nearest_boundary,
                    &scan.active_ids,
                    SwapDirection::OneForZero,
                );
                final_sqrt_price = scan.nearest_boundary;
                x_out += x_delta;
                y_remaining -= y_delta;
                scan = self.scan_ranges(self.sqrt_price, SwapDirection::OneForZero);
            }
        }

        if simulate {
            self.restore(snapshot);
            Ok(SwapExecution::Simulated {
                amount_out: x_out,
                sqrt_price: final_sqrt_price,
            })
        } else {
            info!(
                amount_in = amount,
                amount_out = x_out / TOKEN_SCALE,
                price = self.current_price,
                "swap committed: y -> x"
            );
            Ok(SwapExecution::Committed {
                amount_out: x_out,
                sqrt_price: self.sqrt_price,
            })
        }
    }

    /// Scan all positions at `sqrt_price` (which need not be the pool's
    /// current price: the arbitrage optimizer scans at hypothetical prices
    /// while walking the curve).
    ///
    /// Downward scans consider endpoints strictly below the scan price and
    /// activity `pa < s <= pb`; upward scans mirror both rules. The
    /// asymmetric half-open activity rule prevents double-counting a
    /// position that ends exactly where another begins.
    pub fn scan_ranges(&self, sqrt_price: f64, direction: SwapDirection) -> RangeScan {
        let mut nearest = match direction {
            SwapDirection::ZeroForOne => 0.0,
            SwapDirection::OneForZero => MAX_SQRT_PRICE,
        };
        let mut active_ids = Vec::new();

        for (&id, position) in &self.positions {
            let pa = position.lower_sqrt_price;
            let pb = position.upper_sqrt_price;

            match direction {
                SwapDirection::ZeroForOne => {
                    if pb < sqrt_price && pb > nearest {
                        nearest = pb;
                    }
                    if pa < sqrt_price && pa > nearest {
                        nearest = pa;
                    }
                    if position.active_downward(sqrt_price) {
                        active_ids.push(id);
                    }
                }
                SwapDirection::OneForZero => {
                    if pb > sqrt_price && pb < nearest {
                        nearest = pb;
                    }
                    if pa > sqrt_price && pa < nearest {
                        nearest = pa;
                    }
                    if position.active_upward(sqrt_price) {
                        active_ids.push(id);
                    }
                }
            }
        }

        // Sorted id order makes the liquidity sum and the per-step credit
        // loop independent of map iteration order.
        active_ids.sort_unstable();
        let mut total_liquidity: f64 = active_ids
            .iter()
            .map(|id| self.positions[id].liquidity)
            .sum();

        // A single active position ending exactly at the scan price would
        // make the next sub-step zero-width; treat it as no liquidity so the
        // swap fails instead of dividing by zero.
        if active_ids.len() == 1 {
            let position = &self.positions[&active_ids[0]];
            let ends_here = match direction {
                SwapDirection::ZeroForOne => position.lower_sqrt_price == sqrt_price,
                SwapDirection::OneForZero => position.upper_sqrt_price == sqrt_price,
            };
            if ends_here {
                active_ids.clear();
                total_liquidity = 0.0;
            }
        }

        RangeScan {
            nearest_boundary: nearest,
            active_ids,
            total_liquidity,
        }
    }

    /// Advance the price to `new_sqrt_price` and credit every active
    /// position its share of the sub-step's token deltas and fees.
    fn apply_step(
        &mut self,
        x_delta: f64,
        y_delta: f64,
        total_liquidity: f64,
        new_sqrt_price: f64,
        active_ids: &[u64],
        direction: SwapDirection,
    ) {
        let new_price = sqrt_price_to_price(new_sqrt_price);
        debug!(from = self.current_price, to = new_price, "advancing pool price");
        self.current_price = new_price;
        self.sqrt_price = new_sqrt_price;

        for &id in active_ids {
            let Some(position) = self.positions.get_mut(&id) else {
                continue;
            };
            let share = position.liquidity / total_liquidity;

            match direction {
                SwapDirection::ZeroForOne => {
                    position.x_real += x_delta * share * (1.0 - self.fee);
                    position.y_real += y_delta * share;
                    let fee_x = x_delta / TOKEN_SCALE * share * self.fee;
                    position.fee_x += fee_x;
                    position.fee_in_y += fee_x * new_price;
                }
                SwapDirection::OneForZero => {
                    position.x_real += x_delta * share;
                    position.y_real += y_delta * share * (1.0 - self.fee);
                    let fee_y = y_delta / TOKEN_SCALE * share * self.fee;
                    position.fee_y += fee_y;
                    position.fee_in_y += fee_y;
                }
            }
        }
    }

    fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            positions: self.positions.clone(),
            current_price: self.current_price,
            sqrt_price: self.sqrt_price,
        }
    }

    fn restore(&mut self, snapshot: PoolSnapshot) {
        self.positions = snapshot.positions;
        self.current_price = snapshot.current_price;
        self.sqrt_price = snapshot.sqrt_price;
    }
}

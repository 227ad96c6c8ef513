//! Liquidity positions
//!
//! A position is owned by an opaque `u64` id held in the pool's position map.
//! Token balances and fee counters are mutated only by swap accounting; the
//! creation-time snapshot fields support later P/L analysis.

use serde::Serialize;

/// A liquidity position spanning the square-root-price range
/// `[lower_sqrt_price, upper_sqrt_price]`.
///
/// Balances (`x_real`, `y_real`) are token-scaled; fee counters are in human
/// units. `fee_in_y` accumulates all fees denominated in token Y, valuing X
/// fees at the pool price in effect when they were earned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    /// Lower range endpoint as a Q96-scaled square-root price.
    pub lower_sqrt_price: f64,
    /// Upper range endpoint as a Q96-scaled square-root price. Always
    /// strictly greater than `lower_sqrt_price`.
    pub upper_sqrt_price: f64,
    /// Position liquidity `L`.
    pub liquidity: f64,
    /// Running token-X balance attributable to this position (token-scaled).
    pub x_real: f64,
    /// Running token-Y balance attributable to this position (token-scaled).
    pub y_real: f64,
    /// Accumulated fees in native token X.
    pub fee_x: f64,
    /// Accumulated fees in native token Y.
    pub fee_y: f64,
    /// Accumulated fees denominated in token Y.
    pub fee_in_y: f64,
    /// Pool price when the position was created.
    pub first_price: f64,
    /// Token-X balance at creation, in human units.
    pub x_real_start: f64,
    /// Token-Y balance at creation, in human units.
    pub y_real_start: f64,
}

impl Position {
    /// Whether the position's range half-open-contains `sqrt_price` for a
    /// downward (Z-to-O) scan: `pa < s <= pb`.
    pub fn active_downward(&self, sqrt_price: f64) -> bool {
        self.lower_sqrt_price < sqrt_price && sqrt_price <= self.upper_sqrt_price
    }

    /// Whether the position's range half-open-contains `sqrt_price` for an
    /// upward (O-to-Z) scan: `pa <= s < pb`.
    pub fn active_upward(&self, sqrt_price: f64) -> bool {
        self.lower_sqrt_price <= sqrt_price && sqrt_price < self.upper_sqrt_price
    }
}

//! Square-root price conversions and liquidity sizing formulas
//!
//! The two liquidity formulas derive a position's `L` from a single-token
//! amount and a square-root-price range; they are used only when sizing new
//! positions. The swap loop works with the stored `L` directly.

use crate::constants::Q96;

/// Convert a human-unit price to its Q96-scaled square root,
/// `floor(sqrt(p) * 2^96)`.
///
/// Flooring keeps the conversion deterministic across call sites; every
/// boundary comparison in the engine relies on two conversions of the same
/// price producing bit-identical values.
pub fn price_to_sqrt_price(price: f64) -> f64 {
    (price.sqrt() * Q96).floor()
}

/// Convert a Q96-scaled square-root price back to a human-unit price.
pub fn sqrt_price_to_price(sqrt_price: f64) -> f64 {
    let ratio = sqrt_price / Q96;
    ratio * ratio
}

/// Liquidity obtainable from `amount` of token X over the square-root-price
/// range `[pa, pb]`. Endpoints are swapped into order if reversed.
pub fn liquidity_from_x(amount: f64, pa: f64, pb: f64) -> f64 {
    let (pa, pb) = ordered(pa, pb);
    amount * (pa * pb / Q96) / (pb - pa)
}

/// Liquidity obtainable from `amount` of token Y over the square-root-price
/// range `[pa, pb]`. Endpoints are swapped into order if reversed.
pub fn liquidity_from_y(amount: f64, pa: f64, pb: f64) -> f64 {
    let (pa, pb) = ordered(pa, pb);
    amount * Q96 / (pb - pa)
}

fn ordered(pa: f64, pb: f64) -> (f64, f64) {
    if pa > pb {
        (pb, pa)
    } else {
        (pa, pb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TOKEN_SCALE;
    use approx::assert_relative_eq;

    #[test]
    fn unit_price_converts_to_q96() {
        assert_eq!(price_to_sqrt_price(1.0), Q96);
    }

    #[test]
    fn price_roundtrip() {
        for price in [0.01, 1.0, 42.5, 2000.0, 1e6] {
            let roundtripped = sqrt_price_to_price(price_to_sqrt_price(price));
            assert_relative_eq!(roundtripped, price, max_relative = 1e-12);
        }
    }

    #[test]
    fn conversion_is_deterministic() {
        let a = price_to_sqrt_price(1999.999);
        let b = price_to_sqrt_price(1999.999);
        assert_eq!(a, b);
    }

    #[test]
    fn liquidity_formulas_accept_reversed_endpoints() {
        let pa = price_to_sqrt_price(1500.0);
        let pb = price_to_sqrt_price(2500.0);
        let x = 1.0 * TOKEN_SCALE;
        let y = 2000.0 * TOKEN_SCALE;

        assert_eq!(liquidity_from_x(x, pa, pb), liquidity_from_x(x, pb, pa));
        assert_eq!(liquidity_from_y(y, pa, pb), liquidity_from_y(y, pb, pa));
    }

    #[test]
    fn liquidity_from_y_matches_closed_form() {
        let pa = price_to_sqrt_price(1500.0);
        let pb = price_to_sqrt_price(2500.0);
        let y = 2000.0 * TOKEN_SCALE;

        let expected = y * Q96 / (pb - pa);
        assert_relative_eq!(liquidity_from_y(y, pa, pb), expected, max_relative = 1e-12);
    }
}

//! Fixed-point scale constants shared across the pool engine
//!
//! `Q96` and `TOKEN_SCALE` are the external numeric contract: changing either
//! changes every observable number the simulator produces.

/// Square-root-price scale, `2^96`. Exactly representable in `f64`.
pub const Q96: f64 = 79_228_162_514_264_337_593_543_950_336.0;

/// Token-amount scale (18 decimal places).
pub const TOKEN_SCALE: f64 = 1e18;

/// Sentinel upper bound for upward range scans, far above any realistic
/// square-root price.
pub const MAX_SQRT_PRICE: f64 = 1e12 * Q96;

//! Error types for pool operations
//!
//! All failures here are recoverable: a failed swap rolls the pool back to
//! its pre-swap snapshot, and a failed burn leaves state untouched.

use thiserror::Error;

/// Errors raised by [`crate::Pool::swap`]. The pool state is unchanged when
/// any of these is returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SwapError {
    /// A swap sub-step found no active liquidity before the input was
    /// exhausted.
    #[error("insufficient liquidity to fill the swap")]
    InsufficientLiquidity,

    /// Zero-size swaps are rejected rather than treated as a no-op trade.
    #[error("zero-size swap")]
    ZeroAmount,
}

/// Errors raised by position management.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// [`crate::Pool::burn_liquidity`] was called with an unknown id.
    #[error("position {id} does not exist")]
    PositionNotFound { id: u64 },
}

//! Errors raised by bonding-curve calculations

use thiserror::Error;
use types::FixedPointError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AmmError {
    /// Requested output cannot be served by the pool's reserve
    #[error("Insufficient liquidity: requested output {requested} but reserve is {reserve}")]
    InsufficientLiquidity { requested: u128, reserve: u128 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Newton-Raphson hit its iteration cap
    #[error("Stable-swap solver did not converge within {iterations} iterations")]
    NonConvergence { iterations: u32 },

    #[error(transparent)]
    FixedPoint(#[from] FixedPointError),
}

pub type Result<T> = std::result::Result<T, AmmError>;

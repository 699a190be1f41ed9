//! Swap errors

use amm::AmmError;
use state_pool::StateError;
use thiserror::Error;
use types::{FixedPointError, PoolId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SwapError {
    /// Settled output would fall below the quote's minimum
    #[error("Slippage exceeded: minimum {minimum}, settlement would pay {actual}")]
    SlippageExceeded { minimum: u128, actual: u128 },

    /// The quoted route no longer resolves to a pool for this pair
    #[error("Pool {0} not found for quoted pair")]
    PoolNotFound(PoolId),

    #[error("Invalid swap request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Math(#[from] AmmError),

    #[error(transparent)]
    FixedPoint(#[from] FixedPointError),
}

pub type Result<T> = std::result::Result<T, SwapError>;

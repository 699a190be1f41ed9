//! Registry and ledger errors
//!
//! Every variant is a synchronous reject: the operation that returned it left
//! both the registry and the ledger exactly as they were.

use amm::AmmError;
use thiserror::Error;
use types::{BasisPoints, FixedPointError, PoolId, PositionId, TokenId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Pool {0} not found")]
    PoolNotFound(PoolId),

    #[error("Position {0} not found")]
    PositionNotFound(PositionId),

    #[error("Token '{0}' is not in the catalog")]
    UnknownToken(TokenId),

    #[error("Invalid pool: {0}")]
    InvalidPool(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Deposit strays too far from the pool ratio
    #[error("Amount B {actual} is outside {tolerance} of the pool ratio (expected {expected})")]
    RatioMismatch {
        expected: u128,
        actual: u128,
        tolerance: BasisPoints,
    },

    #[error("Insufficient receipts: requested {requested}, position holds {available}")]
    InsufficientReceipts { requested: u128, available: u128 },

    /// Proposed reserves would decrease the pool's curve invariant
    #[error("Invariant violation on {pool_id}: {reason}")]
    InvariantViolation { pool_id: PoolId, reason: String },

    #[error(transparent)]
    Math(#[from] AmmError),

    #[error(transparent)]
    FixedPoint(#[from] FixedPointError),
}

pub type Result<T> = std::result::Result<T, StateError>;

//! # Pool State - Registry and Liquidity Ledger
//!
//! ## Purpose
//!
//! Owns every pool's reserves, receipt supply and rolling statistics, plus
//! the liquidity positions held against them. All writes go through the
//! [`PoolRegistry`] or the [`LiquidityLedger`]; pool fields that carry
//! balances are not writable from outside this crate.
//!
//! ## Architecture Role
//!
//! ```text
//! EngineConfig seeds → [PoolRegistry] ← reserve updates ← Swap orchestrator
//!                           ↑
//!                   [LiquidityLedger] ← deposits / withdrawals / fee claims
//! ```
//!
//! ## Guarantees
//!
//! - A reserve update that would decrease the pool's curve invariant is rejected
//! - Rejected operations leave registry and ledger untouched
//! - Withdrawals round down, so a deposit/withdraw cycle never pays out more than it took in
//! - Pool and position identifiers are never reused

pub mod error;
pub mod ledger;
pub mod pool;
pub mod registry;

pub use error::{Result, StateError};
pub use ledger::{
    AccruedFees, Deposit, LedgerSettings, LiquidityLedger, LiquidityPosition, PositionState,
    Withdrawal, DEFAULT_FEE_LOOKBACK_MULTIPLIER,
};
pub use pool::{Pool, PoolSort, PoolSpec, PoolStats, RegistryStatistics, SwapRecord};
pub use registry::PoolRegistry;

//! # Tidepool AMM Library - Exact Bonding-Curve Mathematics
//!
//! ## Purpose
//!
//! Pure calculation layer for the Tidepool engine: swap outputs and inverse
//! inputs for constant-product and stable-swap pools, liquidity receipt
//! issuance and redemption, and the advisory analytics shown next to a quote.
//! Nothing here owns state; the pool registry and ledger call in with reserves
//! and apply the results themselves.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Reserves and fee tiers from the pool registry, amounts from callers
//! - **Output Destinations**: Swap orchestrator quotes, liquidity ledger receipts, invariant checks
//! - **Curves**: Constant product (`x * y = k`) and two-token stable swap (amplification `A`)
//! - **Precision**: `u128` smallest units with `U256`/`U512` intermediates, explicit floor/ceil
//!
//! ## Architecture Role
//!
//! ```text
//! registry / ledger / orchestrator
//!              │
//!        CurveType (one match)
//!         ┌────┴─────┐
//!  ConstantProduct  StableSwap
//!         └────┬─────┘
//!   types::fixed_point helpers
//! ```
//!
//! ## Rounding Rules
//!
//! - Outputs and withdrawals round down
//! - Required inputs round up
//! - Fees and slippage floors round down
//! - Only price impact, impermanent loss and pool share use floating point

pub mod analytics;
pub mod constant_product;
pub mod curve;
pub mod error;
pub mod liquidity;
pub mod pool_traits;
pub mod stable_swap;

pub use constant_product::ConstantProductMath;
pub use curve::CurveType;
pub use error::{AmmError, Result};
pub use pool_traits::{AmmPool, SwapLeg};
pub use stable_swap::StableSwapMath;

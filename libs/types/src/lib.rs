//! # Tidepool Types Library
//!
//! Shared type system for the Tidepool AMM engine: token metadata, typed
//! identifiers, and the exact fixed-point helpers every settlement path uses.
//!
//! ## Design Philosophy
//!
//! - **No Precision Loss**: Token amounts are `u128` smallest units; products widen to `U256`
//! - **Type Safety**: Distinct identifier types prevent mixing pools, positions and settlements
//! - **Clear Boundaries**: Explicit conversion points between exact integers and display values
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{parse_amount, format_amount, integer_sqrt, BasisPoints};
//!
//! // Human amounts to smallest units and back
//! let amount = parse_amount("1.5", 6).unwrap();
//! assert_eq!(amount, 1_500_000);
//! assert_eq!(format_amount(amount, 6), "1.5");
//!
//! // First-deposit receipt issuance uses the integer square root
//! assert_eq!(integer_sqrt(4_000_000_000_000), 2_000_000);
//!
//! // Fee tiers at basis-point resolution
//! assert_eq!(BasisPoints::MEDIUM.complement(), 9_970);
//! ```

pub mod common;
pub mod token;

pub use common::errors::{FixedPointError, ValidationError};
pub use common::fixed_point::{
    apply_bps_complement_floor, apply_bps_floor, format_amount, geometric_mean, integer_sqrt,
    integer_sqrt_signed, integer_sqrt_u256, mul_div_ceil, mul_div_floor, narrow_u256,
    narrow_u512, parse_amount, pow10, to_display_decimal, to_display_units, wide_mul,
    BasisPoints, BPS_SCALE,
};
pub use common::identifiers::{PoolId, PositionId, SettlementId, TokenId};
pub use token::{Token, TokenCatalog};

/// Wide integer types used for exact intermediate products
pub use primitive_types::{U256, U512};

/// Decimal type used for USD valuation
pub use rust_decimal::Decimal;

/// Get current timestamp in nanoseconds since Unix epoch
///
/// A clock before the epoch is treated as zero rather than aborting a settlement.
pub fn current_timestamp_ns() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0)
}

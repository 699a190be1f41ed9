//! Liquidity deposit and withdrawal math
//!
//! Receipts are the pool's share tokens. The first deposit mints the
//! geometric mean of the two amounts; later deposits mint pro rata to the
//! token-A side. Withdrawals pay pro rata, rounded down on both sides.

use crate::error::{AmmError, Result};
use types::{apply_bps_floor, geometric_mean, mul_div_floor, BasisPoints};

/// Default accepted deviation from the pool ratio on deposit (0.5%)
pub const DEFAULT_RATIO_TOLERANCE: BasisPoints = BasisPoints::HALF_PERCENT;

/// Token-B amount matching `amount_a` at the current pool ratio
pub fn optimal_amount_b(amount_a: u128, reserve_a: u128, reserve_b: u128) -> Result<u128> {
    if reserve_a == 0 {
        return Err(AmmError::InvalidInput("Reserve A must be positive".into()));
    }
    Ok(mul_div_floor(amount_a, reserve_b, reserve_a)?)
}

/// Whether `amount_b` lies within `optimal_b ± floor(optimal_b * tolerance / 10000)`
pub fn ratio_within_tolerance(
    amount_b: u128,
    optimal_b: u128,
    tolerance: BasisPoints,
) -> Result<bool> {
    let slack = apply_bps_floor(optimal_b, tolerance)?;
    let lower = optimal_b - slack;
    let upper = optimal_b.saturating_add(slack);
    Ok(amount_b >= lower && amount_b <= upper)
}

/// Receipts minted for a deposit
pub fn receipts_to_mint(
    amount_a: u128,
    amount_b: u128,
    reserve_a: u128,
    total_supply: u128,
) -> Result<u128> {
    if total_supply == 0 {
        return Ok(geometric_mean(amount_a, amount_b));
    }
    if reserve_a == 0 {
        return Err(AmmError::InvalidInput(
            "Pool has receipts outstanding but no reserve".into(),
        ));
    }
    Ok(mul_div_floor(amount_a, total_supply, reserve_a)?)
}

/// Token amounts paid out for burning `receipts`
pub fn withdrawal_amounts(
    receipts: u128,
    total_supply: u128,
    reserve_a: u128,
    reserve_b: u128,
) -> Result<(u128, u128)> {
    if total_supply == 0 {
        return Err(AmmError::InvalidInput("Pool has no receipts outstanding".into()));
    }
    if receipts > total_supply {
        return Err(AmmError::InvalidInput(format!(
            "Cannot burn {receipts} receipts from a supply of {total_supply}"
        )));
    }
    let amount_a = mul_div_floor(receipts, reserve_a, total_supply)?;
    let amount_b = mul_div_floor(receipts, reserve_b, total_supply)?;
    Ok((amount_a, amount_b))
}

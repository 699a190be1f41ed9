//! Quote analytics shared by every curve
//!
//! Amount-valued results (fee, minimum received) stay exact integers.
//! Ratio-valued results (price impact, impermanent loss, pool share) are `f64`
//! and are advisory only.

use crate::error::Result;
use types::{apply_bps_complement_floor, apply_bps_floor, BasisPoints};

/// Price impact in percent: `|spot - execution| / spot * 100`
///
/// `spot = reserve_out / reserve_in` and `execution = amount_out / amount_in`,
/// both in smallest units. Callers pass the post-fee input so the fee itself
/// is not counted as impact.
pub fn price_impact(amount_in: u128, amount_out: u128, reserve_in: u128, reserve_out: u128) -> f64 {
    if amount_in == 0 || reserve_in == 0 || reserve_out == 0 {
        return 0.0;
    }
    let spot = reserve_out as f64 / reserve_in as f64;
    let execution = amount_out as f64 / amount_in as f64;
    ((spot - execution) / spot * 100.0).abs()
}

/// Fee charged on an input: `floor(amount_in * fee / 10000)`
pub fn fee_amount(amount_in: u128, fee: BasisPoints) -> Result<u128> {
    Ok(apply_bps_floor(amount_in, fee)?)
}

/// Slippage floor: `floor(amount_out * (10000 - tolerance) / 10000)`
pub fn minimum_received(amount_out: u128, tolerance: BasisPoints) -> Result<u128> {
    Ok(apply_bps_complement_floor(amount_out, tolerance)?)
}

/// Impermanent loss in percent for a price move of `price_ratio`
///
/// `(2 * sqrt(r) / (1 + r) - 1) * 100`; zero at `r = 1`, negative otherwise.
pub fn impermanent_loss(price_ratio: f64) -> f64 {
    if !price_ratio.is_finite() || price_ratio <= 0.0 {
        return 0.0;
    }
    (2.0 * price_ratio.sqrt() / (1.0 + price_ratio) - 1.0) * 100.0
}

/// Share of a pool held by `receipts`, in percent
pub fn share_percentage(receipts: u128, total_supply: u128) -> f64 {
    if total_supply == 0 {
        return 0.0;
    }
    receipts as f64 / total_supply as f64 * 100.0
}

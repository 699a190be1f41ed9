//! Constant-product (x*y=k) AMM math with exact integer rounding
//!
//! Every division states its direction: outputs round down, required inputs
//! round up. That pair of choices is what keeps `reserve_a * reserve_b`
//! non-decreasing across every swap.

use crate::error::{AmmError, Result};
use types::{
    apply_bps_complement_floor, narrow_u256, narrow_u512, wide_mul, BasisPoints, U256, U512,
};

/// Constant-product math functions with zero precision loss
pub struct ConstantProductMath;

impl ConstantProductMath {
    /// Calculate exact output amount using the x*y=k formula
    ///
    /// # Arguments
    /// * `amount_in` - Input token amount (smallest units)
    /// * `reserve_in` - Input token reserve (smallest units)
    /// * `reserve_out` - Output token reserve (smallest units)
    /// * `fee` - Fee in basis points (30 = 0.3%)
    ///
    /// # Returns
    /// `floor(in_after_fee * reserve_out / (reserve_in + in_after_fee))` where
    /// `in_after_fee = floor(amount_in * (10000 - fee) / 10000)`
    pub fn calculate_output_amount(
        amount_in: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee: BasisPoints,
    ) -> Result<u128> {
        if amount_in == 0 {
            return Err(AmmError::InvalidInput("Input amount must be positive".into()));
        }
        if reserve_in == 0 || reserve_out == 0 {
            return Err(AmmError::InvalidInput("Reserves must be positive".into()));
        }

        let amount_in_after_fee = apply_bps_complement_floor(amount_in, fee)?;

        let numerator = wide_mul(amount_in_after_fee, reserve_out);
        let denominator = U256::from(reserve_in) + U256::from(amount_in_after_fee);

        Ok(narrow_u256(numerator / denominator, "constant-product output")?)
    }

    /// Calculate required input amount for desired output (reverse calculation)
    ///
    /// Rounds up twice: first to the smallest post-fee input that buys
    /// `amount_out`, then to the smallest gross input that survives the fee
    /// deduction. Feeding the result back through
    /// [`calculate_output_amount`](Self::calculate_output_amount) therefore
    /// yields at least `amount_out`.
    pub fn calculate_input_amount(
        amount_out: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee: BasisPoints,
    ) -> Result<u128> {
        if amount_out == 0 {
            return Err(AmmError::InvalidInput("Output amount must be positive".into()));
        }
        if amount_out >= reserve_out {
            return Err(AmmError::InsufficientLiquidity {
                requested: amount_out,
                reserve: reserve_out,
            });
        }
        if reserve_in == 0 {
            return Err(AmmError::InvalidInput("Reserves must be positive".into()));
        }

        // ceil(reserve_in * amount_out / (reserve_out - amount_out))
        let remaining = U256::from(reserve_out - amount_out);
        let needed_after_fee =
            (wide_mul(reserve_in, amount_out) + remaining - U256::one()) / remaining;

        // ceil(needed_after_fee * 10000 / (10000 - fee))
        let keep = U512::from(fee.complement());
        let scaled = U512::from(needed_after_fee) * U512::from(types::BPS_SCALE);
        let gross = (scaled + keep - U512::one()) / keep;

        Ok(narrow_u512(gross, "constant-product input")?)
    }

    /// True when `new_a * new_b >= old_a * old_b`
    pub fn invariant_holds(old: (u128, u128), new: (u128, u128)) -> bool {
        wide_mul(new.0, new.1) >= wide_mul(old.0, old.1)
    }

    /// The pool invariant `k = reserve_a * reserve_b`
    pub fn invariant(reserve_a: u128, reserve_b: u128) -> U256 {
        wide_mul(reserve_a, reserve_b)
    }
}

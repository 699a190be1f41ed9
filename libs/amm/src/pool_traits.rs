//! Pool trait definitions for a unified pricing interface

use crate::curve::CurveType;
use crate::error::Result;
use types::BasisPoints;

/// Unified pool interface for quoting in one direction
pub trait AmmPool {
    /// Calculate output amount for given input
    fn get_amount_out(&self, amount_in: u128) -> Result<u128>;

    /// Calculate required input for desired output
    fn get_amount_in(&self, amount_out: u128) -> Result<u128>;

    /// Current `(reserve_in, reserve_out)`
    fn get_liquidity(&self) -> (u128, u128);

    /// Get fee tier
    fn get_fee(&self) -> BasisPoints;
}

/// A pool seen from one swap direction: input reserve first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapLeg {
    pub reserve_in: u128,
    pub reserve_out: u128,
    pub fee: BasisPoints,
    pub curve: CurveType,
}

impl SwapLeg {
    /// Reserves after swapping `amount_in` for `amount_out`, in leg order
    pub fn reserves_after(&self, amount_in: u128, amount_out: u128) -> Option<(u128, u128)> {
        let reserve_in = self.reserve_in.checked_add(amount_in)?;
        let reserve_out = self.reserve_out.checked_sub(amount_out)?;
        Some((reserve_in, reserve_out))
    }
}

impl AmmPool for SwapLeg {
    fn get_amount_out(&self, amount_in: u128) -> Result<u128> {
        self.curve
            .output_amount(amount_in, self.reserve_in, self.reserve_out, self.fee)
    }

    fn get_amount_in(&self, amount_out: u128) -> Result<u128> {
        self.curve
            .input_amount(amount_out, self.reserve_in, self.reserve_out, self.fee)
    }

    fn get_liquidity(&self) -> (u128, u128) {
        (self.reserve_in, self.reserve_out)
    }

    fn get_fee(&self) -> BasisPoints {
        self.fee
    }
}

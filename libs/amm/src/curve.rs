//! Curve selection and dispatch
//!
//! A pool carries one [`CurveType`]; every pricing and invariant question is
//! answered through the single match in this module so adding a curve is a
//! compile error everywhere it is not yet handled.

use crate::constant_product::ConstantProductMath;
use crate::error::{AmmError, Result};
use crate::stable_swap::StableSwapMath;
use serde::{Deserialize, Serialize};
use std::fmt;
use types::BasisPoints;

/// Bonding curve used by a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurveType {
    /// `x * y = k`
    #[default]
    ConstantProduct,
    /// Amplified stable invariant for pegged pairs
    StableSwap { amplification: u32 },
}

impl CurveType {
    /// Reject curve parameters that make the math undefined
    pub fn validate(&self) -> Result<()> {
        match self {
            CurveType::ConstantProduct => Ok(()),
            CurveType::StableSwap { amplification: 0 } => Err(AmmError::InvalidInput(
                "Stable-swap amplification must be positive".into(),
            )),
            CurveType::StableSwap { .. } => Ok(()),
        }
    }

    pub fn output_amount(
        &self,
        amount_in: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee: BasisPoints,
    ) -> Result<u128> {
        match *self {
            CurveType::ConstantProduct => {
                ConstantProductMath::calculate_output_amount(
                    amount_in,
                    reserve_in,
                    reserve_out,
                    fee,
                )
            }
            CurveType::StableSwap { amplification } => StableSwapMath::calculate_output_amount(
                amount_in,
                reserve_in,
                reserve_out,
                amplification,
                fee,
            ),
        }
    }

    pub fn input_amount(
        &self,
        amount_out: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee: BasisPoints,
    ) -> Result<u128> {
        match *self {
            CurveType::ConstantProduct => {
                ConstantProductMath::calculate_input_amount(
                    amount_out,
                    reserve_in,
                    reserve_out,
                    fee,
                )
            }
            CurveType::StableSwap { amplification } => StableSwapMath::calculate_input_amount(
                amount_out,
                reserve_in,
                reserve_out,
                amplification,
                fee,
            ),
        }
    }

    /// Whether moving from `old` to `new` reserves keeps the curve invariant from decreasing
    pub fn invariant_holds(&self, old: (u128, u128), new: (u128, u128)) -> Result<bool> {
        match *self {
            CurveType::ConstantProduct => Ok(ConstantProductMath::invariant_holds(old, new)),
            CurveType::StableSwap { amplification } => {
                StableSwapMath::invariant_holds(old, new, amplification)
            }
        }
    }
}

impl fmt::Display for CurveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveType::ConstantProduct => write!(f, "constant-product"),
            CurveType::StableSwap { amplification } => write!(f, "stable-swap(A={amplification})"),
        }
    }
}

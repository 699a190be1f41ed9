//! Fixed-point arithmetic helpers for exact token-amount calculations
//!
//! Token amounts are stored as `u128` integers in the token's smallest unit
//! (e.g. 1 SUI = 1_000_000_000). Every product of two amounts is widened to
//! `U256` before division so no intermediate can overflow, and every division
//! states its rounding direction explicitly.
//!
//! ## Design Principles
//!
//! - **No Precision Loss**: Settlement paths never touch floating point
//! - **Explicit Rounding**: `*_floor` / `*_ceil` in every helper name
//! - **Checked Narrowing**: Results that do not fit `u128` return [`FixedPointError::Overflow`]
//! - **Clear Boundaries**: `to_display_*` conversions exist only for USD valuation and UI

use crate::common::errors::{FixedPointError, ValidationError};
use primitive_types::{U256, U512};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Basis-point scale (10,000 bps = 100%)
pub const BPS_SCALE: u32 = 10_000;

/// Largest precision whose scale factor fits in `u128`
pub const MAX_AMOUNT_DECIMALS: u8 = 38;

/// Largest precision `rust_decimal` can represent exactly
const MAX_DECIMAL_SCALE: u8 = 28;

/// A fraction at 1/10000 resolution, used for fee tiers and slippage tolerances
///
/// Always strictly below 100%: a 100% fee or tolerance has no meaning for
/// the engine and would make several formulas divide by zero.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct BasisPoints(u32);

impl BasisPoints {
    /// 0%
    pub const ZERO: Self = Self(0);

    /// 0.05% fee tier (pegged pairs)
    pub const LOW: Self = Self(5);

    /// 0.3% fee tier (standard pairs)
    pub const MEDIUM: Self = Self(30);

    /// 0.5%, the default slippage and deposit-ratio tolerance
    pub const HALF_PERCENT: Self = Self(50);

    /// 1% fee tier (exotic pairs)
    pub const HIGH: Self = Self(100);

    /// Create from a raw basis-point value, rejecting anything `>= 10000`
    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if value >= BPS_SCALE {
            return Err(ValidationError::BasisPointsOutOfRange {
                value,
                max: BPS_SCALE,
            });
        }
        Ok(Self(value))
    }

    /// Create from a fraction such as `0.003`, rounding down to whole basis points
    ///
    /// A tiny epsilon absorbs binary representation error so `0.0007` maps to
    /// 7 bps rather than 6.
    pub fn from_fraction(fraction: f64) -> Result<Self, ValidationError> {
        if !fraction.is_finite() || fraction < 0.0 {
            return Err(ValidationError::Custom {
                message: format!("fraction {fraction} must be finite and non-negative"),
            });
        }
        let scaled = (fraction * BPS_SCALE as f64 + 1e-9).floor();
        if scaled >= BPS_SCALE as f64 {
            return Err(ValidationError::BasisPointsOutOfRange {
                value: scaled as u32,
                max: BPS_SCALE,
            });
        }
        Ok(Self(scaled as u32))
    }

    /// Raw basis-point value
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// `10000 - self`, the multiplier kept after deducting this fraction
    #[inline]
    pub const fn complement(self) -> u32 {
        BPS_SCALE - self.0
    }

    /// Fraction form for display (`30` bps -> `0.003`)
    pub fn to_fraction(self) -> f64 {
        self.0 as f64 / BPS_SCALE as f64
    }
}

impl TryFrom<u32> for BasisPoints {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BasisPoints> for u32 {
    fn from(bps: BasisPoints) -> Self {
        bps.0
    }
}

impl fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0 as f64 / 100.0)
    }
}

/// `10^decimals` as an exact integer
pub fn pow10(decimals: u8) -> Result<u128, FixedPointError> {
    10u128
        .checked_pow(decimals as u32)
        .ok_or(FixedPointError::Overflow {
            context: "decimal scale factor",
        })
}

/// Parse a human decimal string into smallest token units
///
/// Fractional digits are padded or truncated to exactly `decimals` places:
/// `parse_amount("1.5", 6) == 1_500_000`, `parse_amount("0.1234567", 6) == 123_456`.
pub fn parse_amount(input: &str, decimals: u8) -> Result<u128, FixedPointError> {
    let invalid = || FixedPointError::InvalidDecimal {
        input: input.to_string(),
    };

    let trimmed = input.trim();
    let (integer_part, fractional_part) = match trimmed.split_once('.') {
        Some((int, frac)) => (int, frac),
        None => (trimmed, ""),
    };

    if integer_part.is_empty() && fractional_part.is_empty() {
        return Err(invalid());
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(integer_part) || !all_digits(fractional_part) {
        return Err(invalid());
    }

    let scale = pow10(decimals)?;
    let overflow = FixedPointError::Overflow {
        context: "parsed amount",
    };

    let whole = if integer_part.is_empty() {
        0
    } else {
        integer_part.parse::<u128>().map_err(|_| overflow.clone())?
    };

    // Pad/truncate the fraction to exactly `decimals` digits
    let mut fraction_digits: String = fractional_part
        .chars()
        .take(decimals as usize)
        .collect();
    while fraction_digits.len() < decimals as usize {
        fraction_digits.push('0');
    }
    let fraction = if fraction_digits.is_empty() {
        0
    } else {
        fraction_digits
            .parse::<u128>()
            .map_err(|_| overflow.clone())?
    };

    whole
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_add(fraction))
        .ok_or(overflow)
}

/// Format smallest-unit amounts as a human decimal string
///
/// Trailing zeros in the fraction are trimmed; exact values collapse to an integer.
pub fn format_amount(amount: u128, decimals: u8) -> String {
    let Ok(scale) = pow10(decimals) else {
        // Scale beyond u128 means the whole amount is fractional
        return format!("0.{:0>width$}", amount, width = decimals as usize)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string();
    };

    let integer_part = amount / scale;
    let fractional_part = amount % scale;
    if fractional_part == 0 {
        return integer_part.to_string();
    }

    let padded = format!("{:0>width$}", fractional_part, width = decimals as usize);
    format!("{}.{}", integer_part, padded.trim_end_matches('0'))
}

/// Largest `k` with `k² <= n`, by Newton's method in O(log n) iterations
pub fn integer_sqrt_u256(n: U256) -> u128 {
    if n < U256::from(2u8) {
        return n.low_u128();
    }

    // ceil(n / 2) without overflowing n + 1
    let mut x = n;
    let mut y = (n >> 1) + (n & U256::one());
    while y < x {
        x = y;
        y = (x + n / x) >> 1;
    }

    // sqrt of a 256-bit value always fits in 128 bits
    x.low_u128()
}

/// Largest `k` with `k² <= n`
pub fn integer_sqrt(n: u128) -> u128 {
    integer_sqrt_u256(U256::from(n))
}

/// Integer square root of a signed value; negative input is a [`FixedPointError::DomainError`]
pub fn integer_sqrt_signed(n: i128) -> Result<u128, FixedPointError> {
    if n < 0 {
        return Err(FixedPointError::DomainError {
            reason: format!("square root of negative value {n}"),
        });
    }
    Ok(integer_sqrt(n as u128))
}

/// `floor(sqrt(a * b))` with the product computed exactly
///
/// This is the geometric-mean bootstrap used for first-deposit receipt issuance.
pub fn geometric_mean(a: u128, b: u128) -> u128 {
    integer_sqrt_u256(U256::from(a) * U256::from(b))
}

/// Exact `a * b` as a 256-bit value
#[inline]
pub fn wide_mul(a: u128, b: u128) -> U256 {
    U256::from(a) * U256::from(b)
}

/// Narrow a 256-bit value back to `u128`
pub fn narrow_u256(value: U256, context: &'static str) -> Result<u128, FixedPointError> {
    if value.bits() > 128 {
        return Err(FixedPointError::Overflow { context });
    }
    Ok(value.low_u128())
}

/// Narrow a 512-bit value back to `u128`
pub fn narrow_u512(value: U512, context: &'static str) -> Result<u128, FixedPointError> {
    if value.bits() > 128 {
        return Err(FixedPointError::Overflow { context });
    }
    Ok(value.low_u128())
}

/// `floor(a * b / d)` without intermediate overflow
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> Result<u128, FixedPointError> {
    if d == 0 {
        return Err(FixedPointError::DivisionByZero);
    }
    narrow_u256(wide_mul(a, b) / U256::from(d), "mul_div_floor result")
}

/// `ceil(a * b / d)` without intermediate overflow
pub fn mul_div_ceil(a: u128, b: u128, d: u128) -> Result<u128, FixedPointError> {
    if d == 0 {
        return Err(FixedPointError::DivisionByZero);
    }
    let divisor = U256::from(d);
    // a*b <= 2^256 - 2^129 + 1, so adding d - 1 < 2^128 cannot overflow
    let rounded = (wide_mul(a, b) + divisor - U256::one()) / divisor;
    narrow_u256(rounded, "mul_div_ceil result")
}

/// Scale `amount` by `(10000 - bps) / 10000`, rounding down
pub fn apply_bps_complement_floor(amount: u128, bps: BasisPoints) -> Result<u128, FixedPointError> {
    mul_div_floor(amount, bps.complement() as u128, BPS_SCALE as u128)
}

/// Scale `amount` by `bps / 10000`, rounding down
pub fn apply_bps_floor(amount: u128, bps: BasisPoints) -> Result<u128, FixedPointError> {
    mul_div_floor(amount, bps.value() as u128, BPS_SCALE as u128)
}

/// Convert smallest units to whole-token units as `f64`
///
/// # Warning
/// Display and advisory metrics only. Never feed the result back into settlement.
pub fn to_display_units(amount: u128, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}

/// Convert smallest units to whole-token units as a `Decimal`
///
/// Exact when the amount fits Decimal's 96-bit mantissa and the precision is at
/// most 28; otherwise falls back through `f64` (display-only value).
pub fn to_display_decimal(amount: u128, decimals: u8) -> Decimal {
    if decimals <= MAX_DECIMAL_SCALE {
        if let Ok(signed) = i128::try_from(amount) {
            if let Ok(value) = Decimal::try_from_i128_with_scale(signed, decimals as u32) {
                return value.normalize();
            }
        }
    }
    Decimal::from_f64(to_display_units(amount, decimals)).unwrap_or(Decimal::MAX)
}

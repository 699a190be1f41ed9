//! Two-token stable-swap (Curve-style) math with exact integer iteration
//!
//! Pricing solves the stable invariant for the post-trade output reserve with
//! Newton-Raphson on 512-bit integers. The amplified invariant with
//! `Ann = A * 2` is
//!
//! ```text
//! Ann * (x + y) + D = Ann * D + D^3 / (4 * x * y)
//! ```
//!
//! Quotes take `D = reserve_in + reserve_out`, which is never below the true
//! invariant, so quoted outputs err on the side of the pool.

use crate::error::{AmmError, Result};
use tracing::debug;
use types::{apply_bps_complement_floor, narrow_u512, BasisPoints, U512};

/// Hard cap on Newton-Raphson iterations
pub const MAX_ITERATIONS: u32 = 255;

/// Upper bound on steps taken by the inverse search
const MAX_SEARCH_STEPS: u32 = 256;

/// Stable-swap math for pegged pairs
pub struct StableSwapMath;

impl StableSwapMath {
    /// Calculate output amount for a stable pool
    ///
    /// The fee is deducted from the input first. Newton-Raphson then finds the
    /// new output reserve `y` and the trader receives `reserve_out - y - 1`;
    /// the extra unit absorbs the rounding of the integer solve.
    pub fn calculate_output_amount(
        amount_in: u128,
        reserve_in: u128,
        reserve_out: u128,
        amplification: u32,
        fee: BasisPoints,
    ) -> Result<u128> {
        if amount_in == 0 {
            return Err(AmmError::InvalidInput("Input amount must be positive".into()));
        }
        if reserve_in == 0 || reserve_out == 0 {
            return Err(AmmError::InvalidInput("Reserves must be positive".into()));
        }
        if amplification == 0 {
            return Err(AmmError::InvalidInput("Amplification must be positive".into()));
        }

        let amount_in_after_fee = apply_bps_complement_floor(amount_in, fee)?;
        let d = U512::from(reserve_in) + U512::from(reserve_out);
        let x = U512::from(reserve_in) + U512::from(amount_in_after_fee);

        let y = Self::solve_y(x, d, amplification)?;
        let output = U512::from(reserve_out).saturating_sub(y).saturating_sub(U512::one());

        narrow_u512(output, "stable-swap output").map_err(AmmError::from)
    }

    /// Smallest input whose forward output reaches `amount_out`
    ///
    /// The forward solver is monotone in its input, so an exponential probe
    /// followed by bisection finds the boundary in at most 256 evaluations.
    pub fn calculate_input_amount(
        amount_out: u128,
        reserve_in: u128,
        reserve_out: u128,
        amplification: u32,
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

        let forward = |amount_in: u128| {
            Self::calculate_output_amount(amount_in, reserve_in, reserve_out, amplification, fee)
        };

        // Grow the upper bound until it buys enough
        let mut steps = 0u32;
        let mut low = 0u128;
        let mut high = amount_out;
        while forward(high)? < amount_out {
            steps += 1;
            if steps >= MAX_SEARCH_STEPS / 2 {
                return Err(AmmError::InsufficientLiquidity {
                    requested: amount_out,
                    reserve: reserve_out,
                });
            }
            low = high;
            high = high.checked_mul(2).ok_or(AmmError::InsufficientLiquidity {
                requested: amount_out,
                reserve: reserve_out,
            })?;
        }

        // forward(low) < amount_out <= forward(high)
        while high - low > 1 {
            steps += 1;
            if steps >= MAX_SEARCH_STEPS {
                return Err(AmmError::NonConvergence {
                    iterations: MAX_SEARCH_STEPS,
                });
            }
            let mid = low + (high - low) / 2;
            if forward(mid)? >= amount_out {
                high = mid;
            } else {
                low = mid;
            }
        }

        debug!(amount_out, amount_in = high, steps, "stable-swap inverse resolved");
        Ok(high)
    }

    /// Solve the invariant for the output-side reserve given input-side reserve `x`
    ///
    /// Iterates `y = (y^2 + c) / (2y + b - D)` from `y = D` with
    /// `c = D^3 / (4 * x * Ann)` and `b = x + D / Ann`, then settles on the
    /// smallest integer `y` with `y^2 + (b - D) * y >= c`.
    pub fn solve_y(x: U512, d: U512, amplification: u32) -> Result<U512> {
        if x.is_zero() {
            return Err(AmmError::InvalidInput("Input reserve must be positive".into()));
        }
        let ann = U512::from(amplification) * U512::from(2u8);
        let four = U512::from(4u8);

        // Rounding c up and b down both push y higher
        let c_den = x * four * ann;
        let c = (d * d * d + c_den - U512::one()) / c_den;
        let b = x + d / ann;

        // y^2 + b*y >= c + D*y, kept unsigned
        let satisfies = |y: U512| y * y + b * y >= c + d * y;

        let mut y = d;
        let mut converged = false;
        for _ in 0..MAX_ITERATIONS {
            let previous = y;
            let denominator = y * U512::from(2u8) + b;
            if denominator <= d {
                return Err(AmmError::NonConvergence {
                    iterations: MAX_ITERATIONS,
                });
            }
            y = (y * y + c) / (denominator - d);
            let delta = if y > previous { y - previous } else { previous - y };
            if delta <= U512::one() {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(AmmError::NonConvergence {
                iterations: MAX_ITERATIONS,
            });
        }

        // Newton lands within a unit or two of the root; step onto it exactly
        let mut corrections = 0u32;
        while !satisfies(y) {
            y += U512::one();
            corrections += 1;
            if corrections > MAX_ITERATIONS {
                return Err(AmmError::NonConvergence {
                    iterations: MAX_ITERATIONS,
                });
            }
        }
        while !y.is_zero() && satisfies(y - U512::one()) {
            y -= U512::one();
            corrections += 1;
            if corrections > MAX_ITERATIONS {
                return Err(AmmError::NonConvergence {
                    iterations: MAX_ITERATIONS,
                });
            }
        }

        Ok(y)
    }

    /// Compute the stable invariant `D` for reserves `(x, y)`
    pub fn compute_d(x: u128, y: u128, amplification: u32) -> Result<U512> {
        if x == 0 || y == 0 {
            return Err(AmmError::InvalidInput("Reserves must be positive".into()));
        }
        if amplification == 0 {
            return Err(AmmError::InvalidInput("Amplification must be positive".into()));
        }

        let x = U512::from(x);
        let y = U512::from(y);
        let sum = x + y;
        let ann = U512::from(amplification) * U512::from(2u8);
        let two = U512::from(2u8);

        let mut d = sum;
        for _ in 0..MAX_ITERATIONS {
            let d_p = d * d / (x * two) * d / (y * two);
            let previous = d;
            d = (ann * sum + d_p * two) * d
                / ((ann - U512::one()) * d + U512::from(3u8) * d_p);
            let delta = if d > previous { d - previous } else { previous - d };
            if delta <= U512::one() {
                return Ok(d);
            }
        }

        Err(AmmError::NonConvergence {
            iterations: MAX_ITERATIONS,
        })
    }

    /// True when the invariant of the new reserves is at least that of the old
    pub fn invariant_holds(
        old: (u128, u128),
        new: (u128, u128),
        amplification: u32,
    ) -> Result<bool> {
        let before = Self::compute_d(old.0, old.1, amplification)?;
        let after = Self::compute_d(new.0, new.1, amplification)?;
        Ok(after >= before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant_product::ConstantProductMath;
    use proptest::prelude::*;

    const STABLE_RESERVE: u128 = 500_000_000_000;

    #[test]
    fn test_balanced_stable_swap_is_near_par() {
        // 1,000 USDC into a 500k/500k pool at A=100, 0.05% fee
        let amount_in = 1_000_000_000;
        let out = StableSwapMath::calculate_output_amount(
            amount_in,
            STABLE_RESERVE,
            STABLE_RESERVE,
            100,
            BasisPoints::LOW,
        )
        .unwrap();

        let after_fee = amount_in * 9_995 / 10_000;
        assert!(out < after_fee);
        // Within 0.01% of the post-fee input
        assert!(out > after_fee - after_fee / 10_000, "out = {out}");
    }

    #[test]
    fn test_stable_beats_constant_product_for_pegged_pair() {
        let amount_in = 50_000_000_000;
        let stable = StableSwapMath::calculate_output_amount(
            amount_in,
            STABLE_RESERVE,
            STABLE_RESERVE,
            100,
            BasisPoints::LOW,
        )
        .unwrap();
        let cp = ConstantProductMath::calculate_output_amount(
            amount_in,
            STABLE_RESERVE,
            STABLE_RESERVE,
            BasisPoints::LOW,
        )
        .unwrap();
        assert!(stable > cp);
    }

    #[test]
    fn test_compute_d_of_balanced_pool_is_sum() {
        let d = StableSwapMath::compute_d(STABLE_RESERVE, STABLE_RESERVE, 100).unwrap();
        let sum = U512::from(STABLE_RESERVE * 2);
        assert!(d + U512::one() >= sum && d <= sum + U512::one());
    }

    #[test]
    fn test_swap_preserves_stable_invariant() {
        let amount_in = 10_000_000_000;
        let out = StableSwapMath::calculate_output_amount(
            amount_in,
            STABLE_RESERVE,
            STABLE_RESERVE,
            100,
            BasisPoints::LOW,
        )
        .unwrap();
        assert!(StableSwapMath::invariant_holds(
            (STABLE_RESERVE, STABLE_RESERVE),
            (STABLE_RESERVE + amount_in, STABLE_RESERVE - out),
            100,
        )
        .unwrap());
    }

    #[test]
    fn test_draining_the_pool_is_rejected() {
        let out = StableSwapMath::calculate_output_amount(
            u128::MAX / 4,
            STABLE_RESERVE,
            STABLE_RESERVE,
            100,
            BasisPoints::LOW,
        )
        .unwrap();
        assert!(out < STABLE_RESERVE);

        let err = StableSwapMath::calculate_input_amount(
            STABLE_RESERVE,
            STABLE_RESERVE,
            STABLE_RESERVE,
            100,
            BasisPoints::LOW,
        )
        .unwrap_err();
        assert!(matches!(err, AmmError::InsufficientLiquidity { .. }));
    }

    #[test]
    fn test_inverse_is_minimal() {
        let desired = 2_000_000_000;
        let input = StableSwapMath::calculate_input_amount(
            desired,
            STABLE_RESERVE,
            STABLE_RESERVE,
            100,
            BasisPoints::LOW,
        )
        .unwrap();
        let enough = StableSwapMath::calculate_output_amount(
            input,
            STABLE_RESERVE,
            STABLE_RESERVE,
            100,
            BasisPoints::LOW,
        )
        .unwrap();
        let short = StableSwapMath::calculate_output_amount(
            input - 1,
            STABLE_RESERVE,
            STABLE_RESERVE,
            100,
            BasisPoints::LOW,
        )
        .unwrap();
        assert!(enough >= desired);
        assert!(short < desired);
    }

    #[test]
    fn test_zero_amplification_rejected() {
        assert!(StableSwapMath::calculate_output_amount(1, 1, 1, 0, BasisPoints::LOW).is_err());
        assert!(StableSwapMath::compute_d(1, 1, 0).is_err());
    }

    proptest! {
        #[test]
        fn stable_output_never_exceeds_reserve(
            reserve_in in 1_000_000u128..1_000_000_000_000_000,
            reserve_out in 1_000_000u128..1_000_000_000_000_000,
            amount_in in 1u128..1_000_000_000_000,
            amplification in 1u32..2_000,
        ) {
            let out = StableSwapMath::calculate_output_amount(
                amount_in, reserve_in, reserve_out, amplification, BasisPoints::LOW,
            ).unwrap();
            prop_assert!(out < reserve_out);
        }

        #[test]
        fn stable_inverse_never_short_changes(
            reserve in 1_000_000_000u128..1_000_000_000_000_000,
            fraction in 1u128..900,
            amplification in 1u32..1_000,
        ) {
            let desired = reserve * fraction / 1_000;
            let input = StableSwapMath::calculate_input_amount(
                desired, reserve, reserve, amplification, BasisPoints::LOW,
            ).unwrap();
            let forward = StableSwapMath::calculate_output_amount(
                input, reserve, reserve, amplification, BasisPoints::LOW,
            ).unwrap();
            prop_assert!(forward >= desired);
        }
    }
}

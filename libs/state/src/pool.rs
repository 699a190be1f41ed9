//! Pool State
//!
//! Reserve and receipt bookkeeping for a single pool. Reserves and supply are
//! crate-private: only the registry and the liquidity ledger change them.

use amm::analytics::share_percentage;
use amm::{CurveType, SwapLeg};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use types::{to_display_units, BasisPoints, Decimal, PoolId, TokenCatalog, TokenId};

/// Rolling pool statistics
///
/// Fees are tracked twice: in USD for reporting and in token-A smallest
/// units for fee accrual, so accrual stays exact integer arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub volume_24h_usd: Decimal,
    pub volume_7d_usd: Decimal,
    pub fees_24h_usd: Decimal,
    pub fees_24h_token_a: u128,
    pub swap_count: u64,
    pub last_swap_ns: Option<u64>,
}

/// One settled swap as seen by the statistics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwapRecord {
    pub volume_usd: Decimal,
    pub fee_usd: Decimal,
    /// The fee expressed in token-A smallest units
    pub fee_token_a: u128,
    pub timestamp_ns: u64,
}

/// Everything needed to register a pool
#[derive(Debug, Clone)]
pub struct PoolSpec {
    pub token_a: TokenId,
    pub token_b: TokenId,
    pub reserve_a: u128,
    pub reserve_b: u128,
    /// Outstanding receipts; the geometric mean of the reserves when `None`
    pub total_liquidity: Option<u128>,
    pub fee: BasisPoints,
    pub curve: CurveType,
    pub stats: PoolStats,
    /// Creation time; now when `None`
    pub created_at_ns: Option<u64>,
}

/// Complete state of a single pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub token_a: TokenId,
    pub token_b: TokenId,
    pub fee: BasisPoints,
    pub curve: CurveType,
    pub created_at_ns: u64,

    pub(crate) reserve_a: u128,
    pub(crate) reserve_b: u128,
    pub(crate) total_liquidity: u128,
    pub(crate) stats: PoolStats,
}

impl Pool {
    pub fn reserve_a(&self) -> u128 {
        self.reserve_a
    }

    pub fn reserve_b(&self) -> u128 {
        self.reserve_b
    }

    pub fn reserves(&self) -> (u128, u128) {
        (self.reserve_a, self.reserve_b)
    }

    /// Receipts outstanding
    pub fn total_liquidity(&self) -> u128 {
        self.total_liquidity
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// A pool with no receipts outstanding takes its next deposit at any ratio
    pub fn is_empty(&self) -> bool {
        self.total_liquidity == 0
    }

    /// Check if pool contains a specific token
    pub fn contains(&self, token: &TokenId) -> bool {
        &self.token_a == token || &self.token_b == token
    }

    /// Whether the pool trades `a` against `b`, in either order
    pub fn matches_pair(&self, a: &TokenId, b: &TokenId) -> bool {
        (&self.token_a == a && &self.token_b == b) || (&self.token_a == b && &self.token_b == a)
    }

    /// `Some(true)` when `token` is token A, `Some(false)` when it is token B
    pub fn is_token_a(&self, token: &TokenId) -> Option<bool> {
        if &self.token_a == token {
            Some(true)
        } else if &self.token_b == token {
            Some(false)
        } else {
            None
        }
    }

    /// The pool oriented for a swap that pays in `input`
    pub fn leg(&self, input: &TokenId) -> Option<SwapLeg> {
        let input_is_a = self.is_token_a(input)?;
        let (reserve_in, reserve_out) = if input_is_a {
            (self.reserve_a, self.reserve_b)
        } else {
            (self.reserve_b, self.reserve_a)
        };
        Some(SwapLeg {
            reserve_in,
            reserve_out,
            fee: self.fee,
            curve: self.curve,
        })
    }

    /// Share of the pool held by `receipts`, in percent
    pub fn share_of(&self, receipts: u128) -> f64 {
        share_percentage(receipts, self.total_liquidity)
    }

    /// Token B per token A in display units
    pub fn price(&self, catalog: &TokenCatalog) -> Option<f64> {
        let a = catalog.get(&self.token_a)?;
        let b = catalog.get(&self.token_b)?;
        if self.reserve_a == 0 {
            return None;
        }
        Some(
            to_display_units(self.reserve_b, b.decimals)
                / to_display_units(self.reserve_a, a.decimals),
        )
    }

    /// Total value locked at reference prices
    pub fn tvl_usd(&self, catalog: &TokenCatalog) -> Decimal {
        let value_a = catalog
            .get(&self.token_a)
            .map(|token| token.value_usd(self.reserve_a))
            .unwrap_or_default();
        let value_b = catalog
            .get(&self.token_b)
            .map(|token| token.value_usd(self.reserve_b))
            .unwrap_or_default();
        value_a.saturating_add(value_b)
    }

    /// Annualised fee yield in percent: `fees_24h * 365 / tvl * 100`
    pub fn apr(&self, catalog: &TokenCatalog) -> f64 {
        let tvl = self.tvl_usd(catalog);
        if tvl.is_zero() {
            return 0.0;
        }
        (self.stats.fees_24h_usd * Decimal::from(36_500) / tvl)
            .to_f64()
            .unwrap_or(0.0)
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} [{} {}]",
            self.id, self.token_a, self.token_b, self.curve, self.fee
        )
    }
}

/// Orderings offered for pool listings (all descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolSort {
    Tvl,
    Volume,
    Apr,
}

impl FromStr for PoolSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tvl" => Ok(PoolSort::Tvl),
            "volume" => Ok(PoolSort::Volume),
            "apr" => Ok(PoolSort::Apr),
            other => Err(format!("unknown pool ordering '{other}' (expected tvl, volume or apr)")),
        }
    }
}

/// Aggregate figures across every registered pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryStatistics {
    pub total_value_locked_usd: Decimal,
    pub volume_24h_usd: Decimal,
    pub fees_24h_usd: Decimal,
    pub pool_count: usize,
    pub swap_count: u64,
}

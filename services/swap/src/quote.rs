//! Quote, slippage and settlement value types

use serde::{Deserialize, Serialize};
use std::fmt;
use types::{BasisPoints, PoolId, SettlementId, TokenId};

/// Caller-held slippage preferences
///
/// The deadline is advisory metadata; the engine settles synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlippageSettings {
    pub tolerance: BasisPoints,
    pub deadline_secs: u64,
    /// Use the engine's default tolerance instead of `tolerance`
    pub auto: bool,
}

impl Default for SlippageSettings {
    fn default() -> Self {
        Self {
            tolerance: BasisPoints::HALF_PERCENT,
            deadline_secs: 1_200,
            auto: false,
        }
    }
}

impl SlippageSettings {
    pub fn fixed(tolerance: BasisPoints) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }
}

/// A priced swap, valid against the reserves it was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub input_token: TokenId,
    pub output_token: TokenId,
    pub input_amount: u128,
    pub output_amount: u128,
    /// Percent, advisory
    pub price_impact: f64,
    pub minimum_received: u128,
    /// Fee charged on the input, in input-token units
    pub fee: u128,
    /// Output per input in display units
    pub execution_price: f64,
    /// Tolerance that produced `minimum_received`
    pub slippage_tolerance: BasisPoints,
    pub route: Vec<PoolId>,
}

impl SwapQuote {
    /// First pool on the route
    pub fn pool_id(&self) -> Option<PoolId> {
        self.route.first().copied()
    }
}

/// A swap that settled against the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapSettlement {
    pub settlement_id: SettlementId,
    pub pool_id: PoolId,
    pub input_amount: u128,
    /// Output recomputed at settlement; never below the quote's minimum
    pub output_amount: u128,
    pub fee: u128,
    pub timestamp_ns: u64,
}

impl SwapSettlement {
    pub fn handle(&self) -> String {
        self.settlement_id.to_handle()
    }
}

/// Flat settlement result for collaborators that want success/handle/error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub success: bool,
    pub settlement_handle: Option<String>,
    pub error_message: Option<String>,
}

impl<E: fmt::Display> From<Result<SwapSettlement, E>> for SwapOutcome {
    fn from(result: Result<SwapSettlement, E>) -> Self {
        match result {
            Ok(settlement) => Self {
                success: true,
                settlement_handle: Some(settlement.handle()),
                error_message: None,
            },
            Err(err) => Self {
                success: false,
                settlement_handle: None,
                error_message: Some(err.to_string()),
            },
        }
    }
}

/// Advisory price-impact bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceImpactSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PriceImpactSeverity {
    pub fn message(self) -> &'static str {
        match self {
            PriceImpactSeverity::Low => "Low price impact",
            PriceImpactSeverity::Medium => "Moderate price impact",
            PriceImpactSeverity::High => "High price impact",
            PriceImpactSeverity::Critical => "Critical price impact - consider reducing amount",
        }
    }
}

impl fmt::Display for PriceImpactSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            PriceImpactSeverity::Low => "low",
            PriceImpactSeverity::Medium => "medium",
            PriceImpactSeverity::High => "high",
            PriceImpactSeverity::Critical => "critical",
        };
        f.write_str(level)
    }
}

/// Severity with its user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceImpactWarning {
    pub severity: PriceImpactSeverity,
    pub message: &'static str,
}

/// Upper bounds (percent, exclusive) of the low, medium and high bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for ImpactThresholds {
    fn default() -> Self {
        Self {
            medium: 1.0,
            high: 3.0,
            critical: 5.0,
        }
    }
}

impl From<[f64; 3]> for ImpactThresholds {
    fn from([medium, high, critical]: [f64; 3]) -> Self {
        Self {
            medium,
            high,
            critical,
        }
    }
}

impl ImpactThresholds {
    pub fn classify(&self, impact: f64) -> PriceImpactSeverity {
        if impact < self.medium {
            PriceImpactSeverity::Low
        } else if impact < self.high {
            PriceImpactSeverity::Medium
        } else if impact < self.critical {
            PriceImpactSeverity::High
        } else {
            PriceImpactSeverity::Critical
        }
    }
}

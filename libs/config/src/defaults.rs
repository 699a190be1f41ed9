//! Engine defaults
//!
//! Values used when the configuration file leaves a setting out, kept in one
//! place so the loader, the demo host and the tests agree.

/// Liquidity ledger defaults
pub mod ledger {
    /// Accepted deviation of a deposit from the pool ratio (0.5%)
    pub const RATIO_TOLERANCE_BPS: u32 = 50;

    /// Trailing-window multiplier applied to 24h fees when estimating accrual
    pub const FEE_LOOKBACK_MULTIPLIER: u32 = 30;
}

/// Swap defaults
pub mod swap {
    /// Slippage tolerance offered to callers that have not chosen one (0.5%)
    pub const SLIPPAGE_BPS: u32 = 50;

    /// Advisory transaction deadline (seconds)
    pub const DEADLINE_SECS: u64 = 1_200;

    /// Price-impact severity boundaries in percent: medium, high, critical
    pub const PRICE_IMPACT_THRESHOLDS: [f64; 3] = [1.0, 3.0, 5.0];
}

/// Logging defaults
pub mod logging {
    pub const LEVEL: &str = "info";
}

/// Default configuration file, relative to the working directory
pub const CONFIG_PATH: &str = "config/tidepool.toml";

/// Prefix for environment-variable overrides (`TIDEPOOL_ENGINE__LOG_LEVEL=debug`)
pub const ENV_PREFIX: &str = "TIDEPOOL";

//! Engine assembly from configuration
//!
//! Builds the registry, ledger and orchestrator a host owns, seeding pools
//! from the configured catalog.

use crate::orchestrator::{OrchestratorSettings, SwapOrchestrator};
use crate::quote::SlippageSettings;
use anyhow::{Context, Result};
use state_pool::{LedgerSettings, LiquidityLedger, PoolRegistry, PoolSpec, PoolStats};
use tidepool_config::{EngineConfig, PoolSeed};
use tracing::info;
use types::{current_timestamp_ns, TokenCatalog};

const NANOS_PER_DAY: u64 = 86_400 * 1_000_000_000;

/// Everything a host needs to serve quotes, swaps and positions
#[derive(Debug)]
pub struct Engine {
    pub registry: PoolRegistry,
    pub ledger: LiquidityLedger,
    pub orchestrator: SwapOrchestrator,
    /// Slippage offered to callers that bring none of their own
    pub slippage: SlippageSettings,
}

impl Engine {
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let settings = &config.engine;
        let default_slippage = settings.default_slippage()?;

        let mut registry = PoolRegistry::new(config.token_catalog()?);
        let now = current_timestamp_ns();
        for seed in &config.pools {
            let spec = pool_spec(seed, registry.catalog(), now)?;
            registry
                .seed_pool(spec)
                .with_context(|| format!("Failed to seed pool {}/{}", seed.token_a, seed.token_b))?;
        }

        let ledger = LiquidityLedger::new(LedgerSettings {
            ratio_tolerance: settings.ratio_tolerance()?,
            fee_lookback_multiplier: settings.fee_lookback_multiplier,
        });
        let orchestrator = SwapOrchestrator::new(OrchestratorSettings {
            default_slippage,
            impact_thresholds: settings.price_impact_thresholds.into(),
        });
        let slippage = SlippageSettings {
            tolerance: default_slippage,
            deadline_secs: settings.default_deadline_secs,
            auto: settings.auto_slippage,
        };

        info!(
            tokens = registry.catalog().len(),
            pools = registry.len(),
            "Engine ready"
        );
        Ok(Self {
            registry,
            ledger,
            orchestrator,
            slippage,
        })
    }
}

/// Registry spec for a configured pool
///
/// Token-A fee units come from the USD fee figure at token A's reference
/// price; creation time is backdated by the seed's age.
fn pool_spec(seed: &PoolSeed, catalog: &TokenCatalog, now_ns: u64) -> Result<PoolSpec> {
    let fees_24h_token_a = catalog
        .get(&seed.token_a)
        .and_then(|token| token.amount_from_usd(seed.fees_24h_usd))
        .unwrap_or(0);

    Ok(PoolSpec {
        token_a: seed.token_a.clone(),
        token_b: seed.token_b.clone(),
        reserve_a: seed.reserve_a,
        reserve_b: seed.reserve_b,
        total_liquidity: seed.total_liquidity,
        fee: seed.fee()?,
        curve: seed.curve_type()?,
        stats: PoolStats {
            volume_24h_usd: seed.volume_24h_usd,
            volume_7d_usd: seed.volume_7d_usd,
            fees_24h_usd: seed.fees_24h_usd,
            fees_24h_token_a,
            swap_count: seed.swap_count,
            last_swap_ns: None,
        },
        created_at_ns: Some(now_ns.saturating_sub(seed.age_days.saturating_mul(NANOS_PER_DAY))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use amm::CurveType;
    use rust_decimal_macros::dec;
    use types::{BasisPoints, Token, TokenId};

    fn config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.tokens = vec![
            Token::new("sui", "SUI", "Sui", 9).with_price(dec!(2.45)),
            Token::new("usdc", "USDC", "USD Coin", 6).with_price(dec!(1)),
        ];
        config.pools = vec![PoolSeed {
            token_a: TokenId::new("sui"),
            token_b: TokenId::new("usdc"),
            reserve_a: 100_000_000_000_000,
            reserve_b: 245_000_000_000,
            total_liquidity: None,
            fee_bps: 30,
            curve: Default::default(),
            amplification: None,
            volume_24h_usd: dec!(1250000),
            volume_7d_usd: dec!(8750000),
            fees_24h_usd: dec!(3750),
            swap_count: 1523,
            age_days: 30,
        }];
        config
    }

    #[test]
    fn test_engine_seeds_pools_from_config() {
        let engine = Engine::from_config(&config()).unwrap();
        let pool = &engine.registry.list_pools()[0];

        assert_eq!(pool.curve, CurveType::ConstantProduct);
        assert_eq!(pool.fee, BasisPoints::MEDIUM);
        assert_eq!(pool.stats().swap_count, 1523);
        // $3750 at $2.45 per SUI
        assert_eq!(pool.stats().fees_24h_token_a, 1_530_612_244_897);
        assert!(pool.created_at_ns <= current_timestamp_ns() - 29 * NANOS_PER_DAY);
        assert_eq!(engine.slippage.tolerance, BasisPoints::HALF_PERCENT);
        assert_eq!(engine.ledger.settings().fee_lookback_multiplier, 30);
    }

    #[test]
    fn test_engine_rejects_invalid_seed() {
        let mut config = config();
        config.pools[0].fee_bps = 10_000;
        assert!(Engine::from_config(&config).is_err());
    }
}

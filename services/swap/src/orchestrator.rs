//! # Swap Orchestrator
//!
//! ## Purpose
//!
//! Prices swaps against the pool registry and settles them. Quoting is pure;
//! settlement recomputes the output from the reserves current at execution
//! time and only then writes, through [`PoolRegistry::update_reserves`], so
//! the curve invariant check guards every settled swap.
//!
//! ## Flow
//!
//! ```text
//! get_quote / reverse_quote → SwapQuote (min received at tolerance)
//!          ↓
//! execute_swap → recompute output → slippage check → update_reserves → record_swap
//! ```
//!
//! A missing pool is not an error at quote time (`Ok(None)`); at execution
//! time a route that no longer resolves is `SwapError::PoolNotFound`.

use crate::error::{Result, SwapError};
use crate::quote::{
    ImpactThresholds, PriceImpactWarning, SlippageSettings, SwapQuote, SwapSettlement,
};
use amm::analytics::{fee_amount, minimum_received, price_impact};
use amm::{AmmError, AmmPool};
use state_pool::{Pool, PoolRegistry, SwapRecord};
use tracing::{debug, info, warn};
use types::{
    current_timestamp_ns, mul_div_floor, to_display_units, BasisPoints, PoolId, SettlementId,
    TokenId,
};

/// Orchestrator tuning, normally taken from the engine configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorSettings {
    /// Tolerance applied when a caller opts into automatic slippage
    pub default_slippage: BasisPoints,
    pub impact_thresholds: ImpactThresholds,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            default_slippage: BasisPoints::HALF_PERCENT,
            impact_thresholds: ImpactThresholds::default(),
        }
    }
}

/// Quotes and settles swaps; owns the settlement sequence
#[derive(Debug, Clone)]
pub struct SwapOrchestrator {
    settings: OrchestratorSettings,
    next_settlement: SettlementId,
}

impl Default for SwapOrchestrator {
    fn default() -> Self {
        Self::new(OrchestratorSettings::default())
    }
}

impl SwapOrchestrator {
    pub fn new(settings: OrchestratorSettings) -> Self {
        Self {
            settings,
            next_settlement: SettlementId::new(1),
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Forward quote for `amount_in` of `input`; `Ok(None)` when no pool trades the pair
    pub fn get_quote(
        &self,
        registry: &PoolRegistry,
        input: &TokenId,
        output: &TokenId,
        amount_in: u128,
        slippage: &SlippageSettings,
    ) -> Result<Option<SwapQuote>> {
        validate_pair(input, output)?;
        if amount_in == 0 {
            return Err(SwapError::InvalidRequest("input amount must be positive".into()));
        }
        let Some(pool) = registry.find_pool(input, output, None) else {
            debug!(%input, %output, "No pool for pair");
            return Ok(None);
        };
        self.quote_on_pool(registry, pool, input, output, amount_in, slippage)
            .map(Some)
    }

    /// Quote that pays at least `desired_out` of `output`
    ///
    /// The required input is rounded up, then priced forward, so the quote's
    /// output is never below `desired_out`.
    pub fn reverse_quote(
        &self,
        registry: &PoolRegistry,
        input: &TokenId,
        output: &TokenId,
        desired_out: u128,
        slippage: &SlippageSettings,
    ) -> Result<Option<SwapQuote>> {
        validate_pair(input, output)?;
        if desired_out == 0 {
            return Err(SwapError::InvalidRequest("desired output must be positive".into()));
        }
        let Some(pool) = registry.find_pool(input, output, None) else {
            return Ok(None);
        };
        let leg = pool.leg(input).ok_or(SwapError::PoolNotFound(pool.id))?;
        let amount_in = leg.get_amount_in(desired_out)?;
        debug!(pool = %pool.id, desired_out, amount_in, "Reverse quote solved");
        self.quote_on_pool(registry, pool, input, output, amount_in, slippage)
            .map(Some)
    }

    /// Settle `quote` against current reserves
    ///
    /// Fails with `SlippageExceeded` when the recomputed output is below the
    /// quote's minimum. On any error the registry is unchanged.
    pub fn execute_swap(
        &mut self,
        registry: &mut PoolRegistry,
        quote: &SwapQuote,
    ) -> Result<SwapSettlement> {
        let pool_id = quote
            .pool_id()
            .ok_or_else(|| SwapError::InvalidRequest("quote has an empty route".into()))?;
        if quote.output_amount < quote.minimum_received {
            return Err(SwapError::SlippageExceeded {
                minimum: quote.minimum_received,
                actual: quote.output_amount,
            });
        }

        let pool = registry
            .get_pool(pool_id)
            .filter(|pool| pool.matches_pair(&quote.input_token, &quote.output_token))
            .ok_or(SwapError::PoolNotFound(pool_id))?;
        let input_is_a = pool.is_token_a(&quote.input_token) == Some(true);
        let leg = pool
            .leg(&quote.input_token)
            .ok_or(SwapError::PoolNotFound(pool_id))?;

        let amount_out = leg.get_amount_out(quote.input_amount)?;
        if amount_out < quote.minimum_received {
            warn!(
                pool = %pool_id,
                minimum = quote.minimum_received,
                actual = amount_out,
                "Swap rejected: slippage exceeded"
            );
            return Err(SwapError::SlippageExceeded {
                minimum: quote.minimum_received,
                actual: amount_out,
            });
        }

        if amount_out == 0 {
            return Err(zero_output(quote.input_amount, &quote.output_token, pool_id));
        }

        let (reserve_in, reserve_out) = leg
            .reserves_after(quote.input_amount, amount_out)
            .ok_or_else(|| AmmError::InvalidInput("swap overflows pool reserves".into()))?;
        let (new_a, new_b) = if input_is_a {
            (reserve_in, reserve_out)
        } else {
            (reserve_out, reserve_in)
        };

        let fee = fee_amount(quote.input_amount, pool.fee)?;
        let fee_token_a = if input_is_a {
            fee
        } else {
            mul_div_floor(fee, pool.reserve_a(), pool.reserve_b())?
        };
        let timestamp_ns = current_timestamp_ns();
        let record = match registry.token(&quote.input_token) {
            Some(token) => SwapRecord {
                volume_usd: token.value_usd(quote.input_amount),
                fee_usd: token.value_usd(fee),
                fee_token_a,
                timestamp_ns,
            },
            None => SwapRecord {
                fee_token_a,
                timestamp_ns,
                ..SwapRecord::default()
            },
        };

        registry.update_reserves(pool_id, new_a, new_b)?;
        registry.record_swap(pool_id, record)?;

        let settlement_id = self.next_settlement;
        self.next_settlement = settlement_id.next();

        info!(
            settlement = %settlement_id,
            pool = %pool_id,
            input = %quote.input_token,
            amount_in = quote.input_amount,
            amount_out,
            fee,
            "Swap settled"
        );

        Ok(SwapSettlement {
            settlement_id,
            pool_id,
            input_amount: quote.input_amount,
            output_amount: amount_out,
            fee,
            timestamp_ns,
        })
    }

    /// Severity band and message for a price impact in percent
    pub fn price_impact_severity(&self, impact: f64) -> PriceImpactWarning {
        let severity = self.settings.impact_thresholds.classify(impact);
        PriceImpactWarning {
            severity,
            message: severity.message(),
        }
    }

    /// Pools to route `input → output` through
    ///
    /// Only direct routes exist. With an amount, the pool paying the most
    /// output wins; without one, the first registered pool for the pair.
    pub fn find_best_route(
        &self,
        registry: &PoolRegistry,
        input: &TokenId,
        output: &TokenId,
        amount_in: Option<u128>,
    ) -> Vec<PoolId> {
        let candidates = registry
            .pools_with_token(input)
            .into_iter()
            .filter(|pool| pool.matches_pair(input, output));

        let best = match amount_in {
            None => candidates.map(|pool| pool.id).next(),
            Some(amount_in) => candidates
                .filter_map(|pool| {
                    let out = pool.leg(input)?.get_amount_out(amount_in).ok()?;
                    (out > 0).then_some((out, pool.id))
                })
                // Ties go to the earlier pool
                .fold(None, |best: Option<(u128, PoolId)>, candidate| match best {
                    Some(current) if current.0 >= candidate.0 => Some(current),
                    _ => Some(candidate),
                })
                .map(|(_, id)| id),
        };
        best.into_iter().collect()
    }

    fn effective_tolerance(&self, slippage: &SlippageSettings) -> BasisPoints {
        if slippage.auto {
            self.settings.default_slippage
        } else {
            slippage.tolerance
        }
    }

    fn quote_on_pool(
        &self,
        registry: &PoolRegistry,
        pool: &Pool,
        input: &TokenId,
        output: &TokenId,
        amount_in: u128,
        slippage: &SlippageSettings,
    ) -> Result<SwapQuote> {
        let leg = pool.leg(input).ok_or(SwapError::PoolNotFound(pool.id))?;
        let amount_out = leg.get_amount_out(amount_in)?;
        if amount_out == 0 {
            return Err(zero_output(amount_in, output, pool.id));
        }
        let fee = fee_amount(amount_in, pool.fee)?;
        let impact = price_impact(amount_in - fee, amount_out, leg.reserve_in, leg.reserve_out);
        let tolerance = self.effective_tolerance(slippage);
        let minimum = minimum_received(amount_out, tolerance)?;

        let execution_price = match (registry.token(input), registry.token(output)) {
            (Some(token_in), Some(token_out)) => {
                to_display_units(amount_out, token_out.decimals)
                    / to_display_units(amount_in, token_in.decimals)
            }
            _ => amount_out as f64 / amount_in as f64,
        };

        debug!(
            pool = %pool.id,
            curve = %pool.curve,
            amount_in,
            amount_out,
            fee,
            impact,
            "Quote computed"
        );

        Ok(SwapQuote {
            input_token: input.clone(),
            output_token: output.clone(),
            input_amount: amount_in,
            output_amount: amount_out,
            price_impact: impact,
            minimum_received: minimum,
            fee,
            execution_price,
            slippage_tolerance: tolerance,
            route: vec![pool.id],
        })
    }
}

fn zero_output(amount_in: u128, output: &TokenId, pool_id: PoolId) -> SwapError {
    SwapError::InvalidRequest(format!(
        "input of {amount_in} buys no {output} from pool {pool_id}"
    ))
}

fn validate_pair(input: &TokenId, output: &TokenId) -> Result<()> {
    if input == output {
        return Err(SwapError::InvalidRequest(format!(
            "cannot swap {input} for itself"
        )));
    }
    Ok(())
}

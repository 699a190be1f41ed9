//! Pool Registry
//!
//! Owns every pool and the token catalog they trade. Pools are kept in
//! creation order; a token index answers "which pools hold this token"
//! without scanning.
//!
//! Reserve writes go through [`PoolRegistry::update_reserves`], which refuses
//! any change that would decrease the pool's curve invariant. Deposits and
//! withdrawals are the only other reserve writers and live in the ledger.

use crate::error::{Result, StateError};
use crate::pool::{Pool, PoolSort, PoolSpec, PoolStats, RegistryStatistics, SwapRecord};
use amm::CurveType;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use types::{
    current_timestamp_ns, geometric_mean, BasisPoints, Decimal, PoolId, Token, TokenCatalog,
    TokenId,
};

/// Manages state for all pools
#[derive(Debug, Clone)]
pub struct PoolRegistry {
    catalog: TokenCatalog,
    pools: Vec<Pool>,
    /// Token index: token id -> pools holding it, in creation order
    token_index: HashMap<TokenId, Vec<PoolId>>,
    next_id: PoolId,
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new(TokenCatalog::new())
    }
}

impl PoolRegistry {
    pub fn new(catalog: TokenCatalog) -> Self {
        Self {
            catalog,
            pools: Vec::new(),
            token_index: HashMap::new(),
            next_id: PoolId::new(1),
        }
    }

    pub fn catalog(&self) -> &TokenCatalog {
        &self.catalog
    }

    pub fn token(&self, id: &TokenId) -> Option<&Token> {
        self.catalog.get(id)
    }

    /// First pool trading the unordered pair, optionally restricted to one fee tier
    pub fn find_pool(&self, a: &TokenId, b: &TokenId, fee: Option<BasisPoints>) -> Option<&Pool> {
        let candidates = self.token_index.get(a)?;
        candidates
            .iter()
            .filter_map(|id| self.get_pool(*id))
            .find(|pool| pool.matches_pair(a, b) && fee.map_or(true, |fee| pool.fee == fee))
    }

    /// Create and register a pool seeded with `amount_a` / `amount_b`
    ///
    /// Initial receipt supply is `floor(sqrt(amount_a * amount_b))`. Zero for
    /// both amounts registers an empty pool whose first deposit sets the price.
    pub fn create_pool(
        &mut self,
        token_a: &TokenId,
        token_b: &TokenId,
        amount_a: u128,
        amount_b: u128,
        fee: BasisPoints,
        curve: CurveType,
    ) -> Result<&Pool> {
        self.seed_pool(PoolSpec {
            token_a: token_a.clone(),
            token_b: token_b.clone(),
            reserve_a: amount_a,
            reserve_b: amount_b,
            total_liquidity: None,
            fee,
            curve,
            stats: PoolStats::default(),
            created_at_ns: None,
        })
    }

    /// Register a pool with explicit supply, statistics and creation time
    pub fn seed_pool(&mut self, spec: PoolSpec) -> Result<&Pool> {
        if let Err(err) = self.validate_spec(&spec) {
            warn!(token_a = %spec.token_a, token_b = %spec.token_b, error = %err, "Pool rejected");
            return Err(err);
        }

        let id = self.next_id;
        let total_liquidity = spec
            .total_liquidity
            .unwrap_or_else(|| geometric_mean(spec.reserve_a, spec.reserve_b));
        let pool = Pool {
            id,
            token_a: spec.token_a,
            token_b: spec.token_b,
            fee: spec.fee,
            curve: spec.curve,
            created_at_ns: spec.created_at_ns.unwrap_or_else(current_timestamp_ns),
            reserve_a: spec.reserve_a,
            reserve_b: spec.reserve_b,
            total_liquidity,
            stats: spec.stats,
        };

        self.token_index.entry(pool.token_a.clone()).or_default().push(id);
        self.token_index.entry(pool.token_b.clone()).or_default().push(id);
        self.next_id = id.next();

        info!(
            pool = %id,
            pair = %format!("{}/{}", pool.token_a, pool.token_b),
            curve = %pool.curve,
            fee = %pool.fee,
            reserve_a = pool.reserve_a,
            reserve_b = pool.reserve_b,
            total_liquidity,
            "Pool created"
        );

        self.pools.push(pool);
        let index = self.pools.len() - 1;
        Ok(&self.pools[index])
    }

    fn validate_spec(&self, spec: &PoolSpec) -> Result<()> {
        for token in [&spec.token_a, &spec.token_b] {
            if self.catalog.get(token).is_none() {
                return Err(StateError::UnknownToken(token.clone()));
            }
        }
        if spec.token_a == spec.token_b {
            return Err(StateError::InvalidPool(format!(
                "cannot pair '{}' with itself",
                spec.token_a
            )));
        }
        match (spec.reserve_a, spec.reserve_b, spec.total_liquidity) {
            // Empty pool: the first deposit sets the ratio
            (0, 0, None | Some(0)) => {}
            (0, 0, Some(_)) => {
                return Err(StateError::InvalidPool(
                    "an empty pool cannot have receipts outstanding".into(),
                ));
            }
            (0, _, _) | (_, 0, _) => {
                return Err(StateError::InvalidPool(
                    "initial amounts must be both positive or both zero".into(),
                ));
            }
            (_, _, Some(0)) => {
                return Err(StateError::InvalidPool(
                    "a funded pool needs receipts outstanding".into(),
                ));
            }
            _ => {}
        }
        spec.curve
            .validate()
            .map_err(|err| StateError::InvalidPool(err.to_string()))
    }

    /// Write new reserves after a swap, provided the curve invariant does not decrease
    pub fn update_reserves(&mut self, pool_id: PoolId, new_a: u128, new_b: u128) -> Result<()> {
        let pool = self.pool_mut(pool_id)?;

        if pool.total_liquidity > 0 && (new_a == 0 || new_b == 0) {
            return Err(StateError::InvariantViolation {
                pool_id,
                reason: "reserves must stay positive while receipts are outstanding".into(),
            });
        }

        let old = pool.reserves();
        if !pool.curve.invariant_holds(old, (new_a, new_b))? {
            warn!(
                pool = %pool_id,
                old_a = old.0,
                old_b = old.1,
                new_a,
                new_b,
                "Reserve update rejected"
            );
            return Err(StateError::InvariantViolation {
                pool_id,
                reason: format!("{} invariant would decrease", pool.curve),
            });
        }

        pool.reserve_a = new_a;
        pool.reserve_b = new_b;
        debug!(pool = %pool_id, reserve_a = new_a, reserve_b = new_b, "Reserves updated");
        Ok(())
    }

    /// Add one settled swap to the pool's rolling statistics
    pub fn record_swap(&mut self, pool_id: PoolId, record: SwapRecord) -> Result<()> {
        let pool = self.pool_mut(pool_id)?;
        let stats = &mut pool.stats;
        stats.volume_24h_usd = stats.volume_24h_usd.saturating_add(record.volume_usd);
        stats.volume_7d_usd = stats.volume_7d_usd.saturating_add(record.volume_usd);
        stats.fees_24h_usd = stats.fees_24h_usd.saturating_add(record.fee_usd);
        stats.fees_24h_token_a = stats.fees_24h_token_a.saturating_add(record.fee_token_a);
        stats.swap_count += 1;
        stats.last_swap_ns = Some(record.timestamp_ns);
        Ok(())
    }

    /// Deposit/withdrawal write path used by the liquidity ledger
    pub(crate) fn apply_liquidity_change(
        &mut self,
        pool_id: PoolId,
        reserve_a: u128,
        reserve_b: u128,
        total_liquidity: u128,
    ) -> Result<()> {
        let pool = self.pool_mut(pool_id)?;
        if total_liquidity > 0 && (reserve_a == 0 || reserve_b == 0) {
            return Err(StateError::InvariantViolation {
                pool_id,
                reason: "reserves must stay positive while receipts are outstanding".into(),
            });
        }
        pool.reserve_a = reserve_a;
        pool.reserve_b = reserve_b;
        pool.total_liquidity = total_liquidity;
        Ok(())
    }

    /// Aggregate TVL, volume, fees and counts across all pools
    pub fn statistics(&self) -> RegistryStatistics {
        self.pools
            .iter()
            .fold(RegistryStatistics::default(), |mut acc, pool| {
                acc.total_value_locked_usd = acc
                    .total_value_locked_usd
                    .saturating_add(pool.tvl_usd(&self.catalog));
                acc.volume_24h_usd = acc.volume_24h_usd.saturating_add(pool.stats.volume_24h_usd);
                acc.fees_24h_usd = acc.fees_24h_usd.saturating_add(pool.stats.fees_24h_usd);
                acc.pool_count += 1;
                acc.swap_count += pool.stats.swap_count;
                acc
            })
    }

    /// All pools in creation order
    pub fn list_pools(&self) -> &[Pool] {
        &self.pools
    }

    pub fn get_pool(&self, pool_id: PoolId) -> Option<&Pool> {
        self.pools.iter().find(|pool| pool.id == pool_id)
    }

    /// Pools holding `token` on either side, in creation order
    pub fn pools_with_token(&self, token: &TokenId) -> Vec<&Pool> {
        self.token_index
            .get(token)
            .map(|ids| ids.iter().filter_map(|id| self.get_pool(*id)).collect())
            .unwrap_or_default()
    }

    /// Pools ordered by TVL, 24h volume or APR, highest first
    pub fn sorted_pools(&self, sort: PoolSort) -> Vec<&Pool> {
        let mut keyed: Vec<(Decimal, &Pool)> = self
            .pools
            .iter()
            .map(|pool| {
                let key = match sort {
                    PoolSort::Tvl => pool.tvl_usd(&self.catalog),
                    PoolSort::Volume => pool.stats.volume_24h_usd,
                    PoolSort::Apr => Decimal::try_from(pool.apr(&self.catalog)).unwrap_or_default(),
                };
                (key, pool)
            })
            .collect();
        keyed.sort_by(|a, b| b.0.cmp(&a.0));
        keyed.into_iter().map(|(_, pool)| pool).collect()
    }

    /// Token B per token A in display units
    pub fn pool_price(&self, pool_id: PoolId) -> Option<f64> {
        self.get_pool(pool_id)?.price(&self.catalog)
    }

    pub fn pool_tvl(&self, pool_id: PoolId) -> Option<Decimal> {
        Some(self.get_pool(pool_id)?.tvl_usd(&self.catalog))
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    fn pool_mut(&mut self, pool_id: PoolId) -> Result<&mut Pool> {
        self.pools
            .iter_mut()
            .find(|pool| pool.id == pool_id)
            .ok_or(StateError::PoolNotFound(pool_id))
    }
}

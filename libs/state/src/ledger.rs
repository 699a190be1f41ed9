//! Liquidity Ledger
//!
//! Tracks liquidity positions and moves reserves for deposits and
//! withdrawals. A position walks `Open -> PartiallyWithdrawn* -> Closed` and
//! leaves the active listing when its last receipt is burned.
//!
//! Derived fields (value, share, impermanent loss, accrued fees) are cached
//! on the position and recomputed by [`LiquidityLedger::refresh_metadata`].
//! Refreshing never moves timestamps, so refreshing twice without an
//! intervening mutation yields identical positions.

use crate::error::{Result, StateError};
use crate::pool::Pool;
use crate::registry::PoolRegistry;
use amm::analytics::impermanent_loss;
use amm::liquidity::{
    optimal_amount_b, ratio_within_tolerance, receipts_to_mint, withdrawal_amounts,
    DEFAULT_RATIO_TOLERANCE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use types::{
    current_timestamp_ns, mul_div_floor, BasisPoints, Decimal, PoolId, PositionId, BPS_SCALE,
};

/// Trailing-window multiplier applied to 24h fees by default
pub const DEFAULT_FEE_LOOKBACK_MULTIPLIER: u32 = 30;

/// Lifecycle of a liquidity position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionState {
    Open,
    PartiallyWithdrawn,
    Closed,
}

/// A holder's stake in one pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityPosition {
    pub id: PositionId,
    pub pool_id: PoolId,
    pub lp_tokens: u128,
    pub share_percentage: f64,
    pub value_usd: Decimal,
    /// Amounts deposited when the position opened
    pub deposit_a: u128,
    pub deposit_b: u128,
    pub fees_a: u128,
    pub fees_b: u128,
    pub fees_usd: Decimal,
    pub impermanent_loss: f64,
    pub state: PositionState,
    pub created_at_ns: u64,
    pub updated_at_ns: u64,
}

/// Result of a deposit
#[derive(Debug, Clone, PartialEq)]
pub struct Deposit {
    pub position: LiquidityPosition,
    pub receipts_minted: u128,
}

/// Result of a withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub amount_a: u128,
    pub amount_b: u128,
    pub remaining_receipts: u128,
    pub state: PositionState,
}

/// Fees attributed to a position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccruedFees {
    pub amount_a: u128,
    pub amount_b: u128,
    pub total_usd: Decimal,
}

/// Ledger tuning, normally taken from the engine configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerSettings {
    /// Accepted deviation of deposit B from the pool ratio
    pub ratio_tolerance: BasisPoints,
    pub fee_lookback_multiplier: u32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            ratio_tolerance: DEFAULT_RATIO_TOLERANCE,
            fee_lookback_multiplier: DEFAULT_FEE_LOOKBACK_MULTIPLIER,
        }
    }
}

/// Active liquidity positions, in opening order
#[derive(Debug, Clone)]
pub struct LiquidityLedger {
    positions: Vec<LiquidityPosition>,
    next_id: PositionId,
    settings: LedgerSettings,
}

impl Default for LiquidityLedger {
    fn default() -> Self {
        Self::new(LedgerSettings::default())
    }
}

impl LiquidityLedger {
    pub fn new(settings: LedgerSettings) -> Self {
        Self {
            positions: Vec::new(),
            next_id: PositionId::new(1),
            settings,
        }
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// Deposit into a pool and open a position for the receipts
    pub fn add_liquidity(
        &mut self,
        registry: &mut PoolRegistry,
        pool_id: PoolId,
        amount_a: u128,
        amount_b: u128,
    ) -> Result<Deposit> {
        if amount_a == 0 || amount_b == 0 {
            return Err(StateError::InvalidAmount(
                "both deposit amounts must be positive".into(),
            ));
        }
        let pool = registry
            .get_pool(pool_id)
            .ok_or(StateError::PoolNotFound(pool_id))?;
        let (reserve_a, reserve_b) = pool.reserves();
        let total = pool.total_liquidity();

        if !pool.is_empty() {
            let optimal_b = optimal_amount_b(amount_a, reserve_a, reserve_b)?;
            if !ratio_within_tolerance(amount_b, optimal_b, self.settings.ratio_tolerance)? {
                warn!(
                    pool = %pool_id,
                    amount_b,
                    optimal_b,
                    "Deposit rejected: ratio mismatch"
                );
                return Err(StateError::RatioMismatch {
                    expected: optimal_b,
                    actual: amount_b,
                    tolerance: self.settings.ratio_tolerance,
                });
            }
        }

        let reserves_before = if pool.is_empty() { 0 } else { reserve_a };
        let receipts = receipts_to_mint(amount_a, amount_b, reserves_before, total)?;
        if receipts == 0 {
            return Err(StateError::InvalidAmount(
                "deposit too small to mint any receipts".into(),
            ));
        }

        let overflow = || StateError::InvalidAmount("deposit overflows pool reserves".into());
        let new_a = reserve_a.checked_add(amount_a).ok_or_else(overflow)?;
        let new_b = reserve_b.checked_add(amount_b).ok_or_else(overflow)?;
        let new_total = total.checked_add(receipts).ok_or_else(overflow)?;

        registry.apply_liquidity_change(pool_id, new_a, new_b, new_total)?;
        let pool = registry
            .get_pool(pool_id)
            .ok_or(StateError::PoolNotFound(pool_id))?;

        let now = current_timestamp_ns();
        let id = self.next_id;
        self.next_id = id.next();
        let position = LiquidityPosition {
            id,
            pool_id,
            lp_tokens: receipts,
            share_percentage: pool.share_of(receipts),
            value_usd: deposit_value_usd(registry, pool, amount_a, amount_b),
            deposit_a: amount_a,
            deposit_b: amount_b,
            fees_a: 0,
            fees_b: 0,
            fees_usd: Decimal::ZERO,
            impermanent_loss: 0.0,
            state: PositionState::Open,
            created_at_ns: now,
            updated_at_ns: now,
        };

        info!(
            position = %id,
            pool = %pool_id,
            amount_a,
            amount_b,
            receipts,
            "Position opened"
        );

        self.positions.push(position.clone());
        Ok(Deposit {
            position,
            receipts_minted: receipts,
        })
    }

    /// Burn `receipts` from a position and pay out its pro-rata reserves
    pub fn remove_liquidity(
        &mut self,
        registry: &mut PoolRegistry,
        position_id: PositionId,
        receipts: u128,
    ) -> Result<Withdrawal> {
        let index = self.index_of(position_id)?;
        let position = &self.positions[index];

        if receipts == 0 {
            return Err(StateError::InvalidAmount(
                "withdrawal must burn at least one receipt".into(),
            ));
        }
        if receipts > position.lp_tokens {
            warn!(
                position = %position_id,
                requested = receipts,
                available = position.lp_tokens,
                "Withdrawal rejected"
            );
            return Err(StateError::InsufficientReceipts {
                requested: receipts,
                available: position.lp_tokens,
            });
        }

        let pool_id = position.pool_id;
        let pool = registry
            .get_pool(pool_id)
            .ok_or(StateError::PoolNotFound(pool_id))?;
        let (reserve_a, reserve_b) = pool.reserves();
        let total = pool.total_liquidity();
        let (amount_a, amount_b) = withdrawal_amounts(receipts, total, reserve_a, reserve_b)?;

        registry.apply_liquidity_change(
            pool_id,
            reserve_a - amount_a,
            reserve_b - amount_b,
            total - receipts,
        )?;

        let remaining = self.positions[index].lp_tokens - receipts;
        let state = if remaining == 0 {
            self.positions.remove(index);
            info!(position = %position_id, pool = %pool_id, amount_a, amount_b, "Position closed");
            PositionState::Closed
        } else {
            let share = registry
                .get_pool(pool_id)
                .map(|pool| pool.share_of(remaining))
                .unwrap_or_default();
            let position = &mut self.positions[index];
            position.lp_tokens = remaining;
            position.share_percentage = share;
            position.state = PositionState::PartiallyWithdrawn;
            position.updated_at_ns = current_timestamp_ns();
            info!(
                position = %position_id,
                pool = %pool_id,
                amount_a,
                amount_b,
                remaining,
                "Position partially withdrawn"
            );
            PositionState::PartiallyWithdrawn
        };

        Ok(Withdrawal {
            amount_a,
            amount_b,
            remaining_receipts: remaining,
            state,
        })
    }

    /// Trailing-window fee estimate for a position
    ///
    /// `fees_a = fees_24h * lookback * floor(share * 10000) / 10000`, with
    /// the share taken from current receipts and `fees_24h` in token-A units.
    /// Token-B fees mirror token-A fees at the current pool ratio.
    pub fn accumulated_fees(
        &self,
        registry: &PoolRegistry,
        position: &LiquidityPosition,
    ) -> Result<AccruedFees> {
        let pool = registry
            .get_pool(position.pool_id)
            .ok_or(StateError::PoolNotFound(position.pool_id))?;
        if pool.is_empty() {
            return Ok(AccruedFees::default());
        }

        let share_bps =
            mul_div_floor(position.lp_tokens, BPS_SCALE as u128, pool.total_liquidity())?;
        let window_fees = pool
            .stats()
            .fees_24h_token_a
            .saturating_mul(self.settings.fee_lookback_multiplier as u128);
        let amount_a = mul_div_floor(window_fees, share_bps, BPS_SCALE as u128)?;
        let amount_b = if pool.reserve_a() == 0 {
            0
        } else {
            mul_div_floor(amount_a, pool.reserve_b(), pool.reserve_a())?
        };

        Ok(AccruedFees {
            amount_a,
            amount_b,
            total_usd: deposit_value_usd(registry, pool, amount_a, amount_b),
        })
    }

    /// Pay out accrued fees and zero the position's fee fields
    ///
    /// Reserves are untouched; fees are tracked outside the pool balances.
    pub fn claim_fees(
        &mut self,
        registry: &PoolRegistry,
        position_id: PositionId,
    ) -> Result<AccruedFees> {
        let index = self.index_of(position_id)?;
        let fees = self.accumulated_fees(registry, &self.positions[index])?;

        let position = &mut self.positions[index];
        position.fees_a = 0;
        position.fees_b = 0;
        position.fees_usd = Decimal::ZERO;
        position.updated_at_ns = current_timestamp_ns();

        info!(
            position = %position_id,
            amount_a = fees.amount_a,
            amount_b = fees.amount_b,
            total_usd = %fees.total_usd,
            "Fees claimed"
        );
        Ok(fees)
    }

    /// Impermanent loss in percent since the position opened
    ///
    /// Compares the pool's current B/A ratio with the deposit's B/A ratio.
    pub fn impermanent_loss(
        &self,
        registry: &PoolRegistry,
        position: &LiquidityPosition,
    ) -> Result<f64> {
        let pool = registry
            .get_pool(position.pool_id)
            .ok_or(StateError::PoolNotFound(position.pool_id))?;
        if position.deposit_a == 0 || position.deposit_b == 0 || pool.reserve_a() == 0 {
            return Ok(0.0);
        }
        let current_price = pool.reserve_b() as f64 / pool.reserve_a() as f64;
        let initial_price = position.deposit_b as f64 / position.deposit_a as f64;
        Ok(impermanent_loss(current_price / initial_price))
    }

    /// Current USD value of the reserves a position could withdraw
    pub fn position_value_usd(
        &self,
        registry: &PoolRegistry,
        position: &LiquidityPosition,
    ) -> Result<Decimal> {
        let pool = registry
            .get_pool(position.pool_id)
            .ok_or(StateError::PoolNotFound(position.pool_id))?;
        if pool.is_empty() {
            return Ok(Decimal::ZERO);
        }
        let (amount_a, amount_b) = withdrawal_amounts(
            position.lp_tokens,
            pool.total_liquidity(),
            pool.reserve_a(),
            pool.reserve_b(),
        )?;
        Ok(deposit_value_usd(registry, pool, amount_a, amount_b))
    }

    /// Recompute value, share, impermanent loss and accrued fees
    pub fn refresh_metadata(
        &mut self,
        registry: &PoolRegistry,
        position_id: PositionId,
    ) -> Result<&LiquidityPosition> {
        let index = self.index_of(position_id)?;
        self.refresh_at(registry, index)?;
        Ok(&self.positions[index])
    }

    fn refresh_at(&mut self, registry: &PoolRegistry, index: usize) -> Result<()> {
        let position = &self.positions[index];
        let value_usd = self.position_value_usd(registry, position)?;
        let impermanent_loss = self.impermanent_loss(registry, position)?;
        let fees = self.accumulated_fees(registry, position)?;
        let share = registry
            .get_pool(position.pool_id)
            .map(|pool| pool.share_of(position.lp_tokens))
            .unwrap_or_default();

        let position = &mut self.positions[index];
        position.value_usd = value_usd;
        position.impermanent_loss = impermanent_loss;
        position.share_percentage = share;
        position.fees_a = fees.amount_a;
        position.fees_b = fees.amount_b;
        position.fees_usd = fees.total_usd;
        debug!(position = %position.id, value_usd = %value_usd, "Position refreshed");
        Ok(())
    }

    /// All active positions, refreshed, in opening order
    pub fn list_positions(&mut self, registry: &PoolRegistry) -> Result<&[LiquidityPosition]> {
        for index in 0..self.positions.len() {
            self.refresh_at(registry, index)?;
        }
        Ok(self.positions.as_slice())
    }

    /// A single position, refreshed; `None` once it is closed or if it never existed
    pub fn get_position(
        &mut self,
        registry: &PoolRegistry,
        position_id: PositionId,
    ) -> Result<Option<&LiquidityPosition>> {
        match self.index_of(position_id) {
            Ok(index) => {
                self.refresh_at(registry, index)?;
                Ok(Some(&self.positions[index]))
            }
            Err(StateError::PositionNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Active positions in one pool, as last refreshed
    pub fn positions_for_pool(&self, pool_id: PoolId) -> Vec<&LiquidityPosition> {
        self.positions
            .iter()
            .filter(|position| position.pool_id == pool_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn index_of(&self, position_id: PositionId) -> Result<usize> {
        self.positions
            .iter()
            .position(|position| position.id == position_id)
            .ok_or(StateError::PositionNotFound(position_id))
    }
}

/// USD value of token amounts in `pool` at reference prices
fn deposit_value_usd(
    registry: &PoolRegistry,
    pool: &Pool,
    amount_a: u128,
    amount_b: u128,
) -> Decimal {
    let value_a = registry
        .token(&pool.token_a)
        .map(|token| token.value_usd(amount_a))
        .unwrap_or_default();
    let value_b = registry
        .token(&pool.token_b)
        .map(|token| token.value_usd(amount_b))
        .unwrap_or_default();
    value_a.saturating_add(value_b)
}

//! Liquidity Ledger Property Tests
//!
//! Deposits, withdrawals and position refreshes against live pools.

use amm::liquidity::{optimal_amount_b, withdrawal_amounts};
use amm::CurveType;
use proptest::prelude::*;
use state_pool::{LedgerSettings, LiquidityLedger, PositionState, StateError};
use swap_service::{SlippageSettings, SwapOrchestrator};
use tidepool_e2e::*;
use types::{BasisPoints, PositionId};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_add_then_remove_all_never_profits(
        reserve_a in reserve_strategy(),
        reserve_b in reserve_strategy(),
        amount_a in 1_000u128..1_000_000_000_000_000,
    ) {
        let (mut registry, pool_id) =
            constant_product_registry(reserve_a, reserve_b, BasisPoints::MEDIUM);
        let mut ledger = LiquidityLedger::default();
        let amount_b = optimal_amount_b(amount_a, reserve_a, reserve_b).unwrap();
        prop_assume!(amount_b > 0);

        let Ok(deposit) = ledger.add_liquidity(&mut registry, pool_id, amount_a, amount_b) else {
            return Ok(());
        };
        let withdrawal = ledger
            .remove_liquidity(&mut registry, deposit.position.id, deposit.receipts_minted)
            .unwrap();

        prop_assert!(withdrawal.amount_a <= amount_a);
        prop_assert!(withdrawal.amount_b <= amount_b);
        prop_assert_eq!(withdrawal.state, PositionState::Closed);
        prop_assert!(ledger.is_empty());
        let pool = registry.get_pool(pool_id).unwrap();
        prop_assert!(pool.reserve_a() >= reserve_a);
        prop_assert!(pool.reserve_b() >= reserve_b);
    }

    #[test]
    fn prop_claims_sum_to_reserves_within_rounding(
        deposits in prop::collection::vec(1_000_000u128..100_000_000_000, 1..8),
    ) {
        let (mut registry, pool_id) = reference_registry();
        let mut ledger = LiquidityLedger::default();
        for amount_a in deposits {
            let (a, b) = registry.get_pool(pool_id).unwrap().reserves();
            let amount_b = optimal_amount_b(amount_a, a, b).unwrap();
            prop_assume!(amount_b > 0);
            ledger.add_liquidity(&mut registry, pool_id, amount_a, amount_b).unwrap();
        }

        let pool = registry.get_pool(pool_id).unwrap().clone();
        let (reserve_a, reserve_b) = pool.reserves();
        let total = pool.total_liquidity();

        let mut claimed_receipts = 0u128;
        let mut claimed = (0u128, 0u128);
        let positions = ledger.positions_for_pool(pool_id);
        let holders = positions.len() as u128 + 1;
        for position in positions {
            claimed_receipts += position.lp_tokens;
            let (a, b) =
                withdrawal_amounts(position.lp_tokens, total, reserve_a, reserve_b).unwrap();
            claimed.0 += a;
            claimed.1 += b;
        }
        // Receipts minted at pool creation belong to no position
        let bootstrap =
            withdrawal_amounts(total - claimed_receipts, total, reserve_a, reserve_b).unwrap();
        claimed.0 += bootstrap.0;
        claimed.1 += bootstrap.1;

        prop_assert!(claimed.0 <= reserve_a && reserve_a - claimed.0 < holders);
        prop_assert!(claimed.1 <= reserve_b && reserve_b - claimed.1 < holders);
    }

    #[test]
    fn prop_refresh_is_idempotent_after_trading(
        amount_a in 1_000_000u128..50_000_000_000,
        trade in 1_000_000u128..20_000_000_000,
    ) {
        let (mut registry, pool_id) = reference_registry();
        let mut ledger = LiquidityLedger::default();
        let mut orchestrator = SwapOrchestrator::default();
        let (a, b) = registry.get_pool(pool_id).unwrap().reserves();
        let amount_b = optimal_amount_b(amount_a, a, b).unwrap();
        let id = ledger
            .add_liquidity(&mut registry, pool_id, amount_a, amount_b)
            .unwrap()
            .position
            .id;

        let quote = orchestrator
            .get_quote(&registry, &sui(), &usdc(), trade, &SlippageSettings::default())
            .unwrap()
            .unwrap();
        orchestrator.execute_swap(&mut registry, &quote).unwrap();

        let first = ledger.refresh_metadata(&registry, id).unwrap().clone();
        let second = ledger.refresh_metadata(&registry, id).unwrap().clone();
        prop_assert_eq!(&first, &second);
        prop_assert!(first.impermanent_loss <= 0.0);
        prop_assert!(first.fees_a > 0 || first.share_percentage < 0.01);
    }

    #[test]
    fn prop_partial_withdrawals_conserve_receipts(
        amount_a in 1_000_000_000u128..50_000_000_000,
        cuts in prop::collection::vec(1u128..=100, 1..6),
    ) {
        let (mut registry, pool_id) = reference_registry();
        let mut ledger = LiquidityLedger::default();
        let (a, b) = registry.get_pool(pool_id).unwrap().reserves();
        let amount_b = optimal_amount_b(amount_a, a, b).unwrap();
        let deposit = ledger.add_liquidity(&mut registry, pool_id, amount_a, amount_b).unwrap();
        let id = deposit.position.id;
        let total_before = registry.get_pool(pool_id).unwrap().total_liquidity();

        let mut burned = 0u128;
        for percent in cuts {
            let Some(position) = ledger.get_position(&registry, id).unwrap() else {
                break;
            };
            let receipts = (position.lp_tokens * percent / 100).max(1);
            let withdrawal = ledger.remove_liquidity(&mut registry, id, receipts).unwrap();
            burned += receipts;
            prop_assert_eq!(withdrawal.remaining_receipts, deposit.receipts_minted - burned);
            let expected = if withdrawal.remaining_receipts == 0 {
                PositionState::Closed
            } else {
                PositionState::PartiallyWithdrawn
            };
            prop_assert_eq!(withdrawal.state, expected);
        }
        prop_assert_eq!(
            registry.get_pool(pool_id).unwrap().total_liquidity(),
            total_before - burned
        );
    }
}

#[test]
fn test_first_deposit_scenario() {
    let mut registry = state_pool::PoolRegistry::new(catalog());
    let pool_id = registry
        .create_pool(&sui(), &usdc(), 0, 0, BasisPoints::MEDIUM, CurveType::ConstantProduct)
        .unwrap()
        .id;
    let mut ledger = LiquidityLedger::default();

    let deposit = ledger
        .add_liquidity(&mut registry, pool_id, 1_000_000, 4_000_000)
        .unwrap();
    assert_eq!(deposit.receipts_minted, 2_000_000);
    assert_eq!(registry.get_pool(pool_id).unwrap().total_liquidity(), 2_000_000);

    // Trading works once the first deposit has set the price
    let mut orchestrator = SwapOrchestrator::default();
    let quote = orchestrator
        .get_quote(&registry, &sui(), &usdc(), 10_000, &SlippageSettings::default())
        .unwrap()
        .unwrap();
    orchestrator.execute_swap(&mut registry, &quote).unwrap();
}

#[test]
fn test_full_removal_closes_position() {
    let (mut registry, pool_id) = reference_registry();
    let mut ledger = LiquidityLedger::default();
    let deposit = ledger
        .add_liquidity(&mut registry, pool_id, 1_000_000_000, 2_450_000)
        .unwrap();

    let withdrawal = ledger
        .remove_liquidity(&mut registry, deposit.position.id, deposit.receipts_minted)
        .unwrap();
    assert_eq!(withdrawal.state, PositionState::Closed);
    assert!(ledger.list_positions(&registry).unwrap().is_empty());
    assert!(ledger.get_position(&registry, deposit.position.id).unwrap().is_none());
}

#[test]
fn test_rejects_leave_everything_unchanged() {
    let (mut registry, pool_id) = reference_registry();
    let mut ledger = LiquidityLedger::new(LedgerSettings {
        ratio_tolerance: BasisPoints::new(10).unwrap(),
        ..LedgerSettings::default()
    });
    let pool_before = registry.get_pool(pool_id).unwrap().clone();

    // 0.2% off the pool ratio, outside a 0.1% tolerance
    let err = ledger
        .add_liquidity(&mut registry, pool_id, 1_000_000_000, 2_454_900)
        .unwrap_err();
    assert!(matches!(err, StateError::RatioMismatch { expected: 2_450_000, .. }));

    let deposit = ledger
        .add_liquidity(&mut registry, pool_id, 1_000_000_000, 2_450_000)
        .unwrap();
    let after_deposit = registry.get_pool(pool_id).unwrap().clone();
    let err = ledger
        .remove_liquidity(&mut registry, deposit.position.id, deposit.receipts_minted + 1)
        .unwrap_err();
    assert!(matches!(err, StateError::InsufficientReceipts { .. }));
    assert!(matches!(
        ledger.claim_fees(&registry, PositionId::new(42)),
        Err(StateError::PositionNotFound(_))
    ));

    assert_eq!(registry.get_pool(pool_id).unwrap(), &after_deposit);
    assert_eq!(after_deposit.reserve_a(), pool_before.reserve_a() + 1_000_000_000);
    assert_eq!(ledger.len(), 1);
}

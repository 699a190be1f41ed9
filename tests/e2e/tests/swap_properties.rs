//! Swap Settlement Property Tests
//!
//! Properties that must hold for every quote and settlement, whatever the
//! reserves, fee tier or trade size.

use amm::{ConstantProductMath, StableSwapMath};
use proptest::prelude::*;
use state_pool::StateError;
use swap_service::{SlippageSettings, SwapError, SwapOrchestrator};
use tidepool_e2e::*;
use types::{wide_mul, BasisPoints, TokenId};

/// One trade in a generated sequence: direction and size as a fraction of the input reserve
#[derive(Debug, Clone, Copy)]
struct Trade {
    a_to_b: bool,
    per_mille: u128,
}

fn trade_strategy() -> impl Strategy<Value = Trade> {
    (any::<bool>(), 1u128..=100).prop_map(|(a_to_b, per_mille)| Trade { a_to_b, per_mille })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_constant_product_k_never_decreases(
        reserve_a in reserve_strategy(),
        reserve_b in reserve_strategy(),
        fee in fee_strategy(),
        trades in prop::collection::vec(trade_strategy(), 1..12),
    ) {
        let (mut registry, pool_id) = constant_product_registry(reserve_a, reserve_b, fee);
        let mut orchestrator = SwapOrchestrator::default();
        let slippage = SlippageSettings::default();

        for trade in trades {
            let pool = registry.get_pool(pool_id).unwrap();
            let (a, b) = pool.reserves();
            let (input, output, reserve_in) = if trade.a_to_b {
                (sui(), usdc(), a)
            } else {
                (usdc(), sui(), b)
            };
            let amount = (reserve_in * trade.per_mille / 1_000).max(1);

            let Ok(Some(quote)) =
                orchestrator.get_quote(&registry, &input, &output, amount, &slippage)
            else {
                continue;
            };
            let k_before = wide_mul(a, b);
            if orchestrator.execute_swap(&mut registry, &quote).is_ok() {
                let (a, b) = registry.get_pool(pool_id).unwrap().reserves();
                prop_assert!(wide_mul(a, b) >= k_before);
                prop_assert!(a > 0 && b > 0);
            }
        }
    }

    #[test]
    fn prop_stable_settlement_never_trips_invariant_guard(
        reserve_a in 1_000_000_000u128..1_000_000_000_000_000,
        skew in 50u128..=200,
        amplification in 1u32..2_000,
        trades in prop::collection::vec(trade_strategy(), 1..6),
    ) {
        let reserve_b = reserve_a * skew / 100;
        let (mut registry, pool_id) = stable_registry(reserve_a, reserve_b, amplification);
        let mut orchestrator = SwapOrchestrator::default();
        let slippage = SlippageSettings::default();

        for trade in trades {
            let (a, b) = registry.get_pool(pool_id).unwrap().reserves();
            let (input, output, reserve_in) = if trade.a_to_b {
                (usdc(), usdt(), a)
            } else {
                (usdt(), usdc(), b)
            };
            let amount = (reserve_in * trade.per_mille / 1_000).max(1);
            let Ok(Some(quote)) =
                orchestrator.get_quote(&registry, &input, &output, amount, &slippage)
            else {
                continue;
            };
            let result = orchestrator.execute_swap(&mut registry, &quote);
            prop_assert!(
                !matches!(result, Err(SwapError::State(StateError::InvariantViolation { .. }))),
                "settlement tripped the invariant guard: {:?}", result
            );
            let (new_a, new_b) = registry.get_pool(pool_id).unwrap().reserves();
            prop_assert!(StableSwapMath::compute_d(new_a, new_b, amplification).unwrap()
                >= StableSwapMath::compute_d(a, b, amplification).unwrap());
        }
    }

    #[test]
    fn prop_reverse_quote_covers_desired_output(
        reserve_a in reserve_strategy(),
        reserve_b in reserve_strategy(),
        fee in fee_strategy(),
        per_mille in 1u128..500,
    ) {
        let (registry, _) = constant_product_registry(reserve_a, reserve_b, fee);
        let orchestrator = SwapOrchestrator::default();
        let desired = (reserve_b * per_mille / 1_000).max(1);

        let quote = orchestrator
            .reverse_quote(&registry, &sui(), &usdc(), desired, &SlippageSettings::default())
            .unwrap()
            .unwrap();
        prop_assert!(quote.output_amount >= desired);
    }

    #[test]
    fn prop_stable_reverse_quote_covers_desired_output(
        reserve in 1_000_000_000u128..1_000_000_000_000_000,
        amplification in 1u32..2_000,
        per_mille in 1u128..300,
    ) {
        let (registry, _) = stable_registry(reserve, reserve, amplification);
        let orchestrator = SwapOrchestrator::default();
        let desired = reserve * per_mille / 1_000;

        let quote = orchestrator
            .reverse_quote(&registry, &usdc(), &usdt(), desired, &SlippageSettings::default())
            .unwrap()
            .unwrap();
        prop_assert!(quote.output_amount >= desired);
        // Minimal: one unit less would not cover it
        let short = StableSwapMath::calculate_output_amount(
            quote.input_amount - 1, reserve, reserve, amplification, BasisPoints::LOW,
        ).unwrap();
        prop_assert!(short < desired);
    }

    #[test]
    fn prop_settlement_matches_recomputation_after_drift(
        fee in fee_strategy(),
        amount in 1_000_000u128..10_000_000_000,
        front_run in 1_000_000u128..50_000_000_000,
        tolerance_bps in 0u32..200,
    ) {
        let (mut registry, pool_id) = constant_product_registry(SUI_RESERVE, USDC_RESERVE, fee);
        let mut orchestrator = SwapOrchestrator::default();
        let slippage = SlippageSettings::fixed(BasisPoints::new(tolerance_bps).unwrap());

        let quote = orchestrator
            .get_quote(&registry, &sui(), &usdc(), amount, &slippage)
            .unwrap()
            .unwrap();
        let drift = orchestrator
            .get_quote(
                &registry,
                &sui(),
                &usdc(),
                front_run,
                &SlippageSettings::fixed(BasisPoints::ZERO),
            )
            .unwrap()
            .unwrap();
        orchestrator.execute_swap(&mut registry, &drift).unwrap();

        let before = registry.get_pool(pool_id).unwrap().clone();
        let (a, b) = before.reserves();
        let recomputed = ConstantProductMath::calculate_output_amount(amount, a, b, fee).unwrap();

        match orchestrator.execute_swap(&mut registry, &quote) {
            Ok(settlement) => {
                prop_assert!(recomputed >= quote.minimum_received);
                prop_assert_eq!(settlement.output_amount, recomputed);
            }
            Err(SwapError::SlippageExceeded { minimum, actual }) => {
                prop_assert!(recomputed < quote.minimum_received);
                prop_assert_eq!(minimum, quote.minimum_received);
                prop_assert_eq!(actual, recomputed);
                prop_assert_eq!(registry.get_pool(pool_id).unwrap(), &before);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }
}

#[test]
fn test_reference_scenario_end_to_end() {
    let (mut registry, pool_id) = reference_registry();
    let mut orchestrator = SwapOrchestrator::default();
    let quote = orchestrator
        .get_quote(&registry, &sui(), &usdc(), 1_000_000_000, &SlippageSettings::default())
        .unwrap()
        .unwrap();

    assert_eq!(quote.output_amount, 997_000_000u128 * 245_000_000 / 100_997_000_000);
    assert!((quote.price_impact - 0.99).abs() < 0.01);
    assert_eq!(
        orchestrator.price_impact_severity(quote.price_impact).message,
        "Low price impact"
    );

    let settlement = orchestrator.execute_swap(&mut registry, &quote).unwrap();
    assert_eq!(settlement.output_amount, quote.output_amount);
    let stats = registry.statistics();
    assert_eq!(stats.swap_count, 1);
    assert_eq!(registry.get_pool(pool_id).unwrap().reserve_a(), SUI_RESERVE + 1_000_000_000);
}

#[test]
fn test_large_trade_is_critical() {
    let (registry, _) = reference_registry();
    let orchestrator = SwapOrchestrator::default();
    let quote = orchestrator
        .get_quote(&registry, &sui(), &usdc(), 20_000_000_000, &SlippageSettings::default())
        .unwrap()
        .unwrap();
    let warning = orchestrator.price_impact_severity(quote.price_impact);
    assert_eq!(warning.severity, swap_service::PriceImpactSeverity::Critical);
}

#[test]
fn test_unknown_pair_has_no_quote_or_route() {
    let (registry, _) = reference_registry();
    let orchestrator = SwapOrchestrator::default();
    let weth = TokenId::new("weth");
    assert!(orchestrator
        .get_quote(&registry, &sui(), &weth, 1_000, &SlippageSettings::default())
        .unwrap()
        .is_none());
    assert!(orchestrator
        .reverse_quote(&registry, &sui(), &usdt(), 1_000, &SlippageSettings::default())
        .unwrap()
        .is_none());
    assert!(orchestrator.find_best_route(&registry, &sui(), &weth, Some(1_000)).is_empty());
}

//! Engine host tests
//!
//! Seeds the engine from the repository configuration and drives it the way
//! a host would, including a multi-threaded host that serialises writers
//! behind a lock.

use parking_lot::RwLock;
use rust_decimal_macros::dec;
use state_pool::PoolSort;
use std::sync::Arc;
use std::thread;
use swap_service::{Engine, SlippageSettings, SwapError, SwapOutcome};
use tidepool_config::EngineConfig;
use tidepool_e2e::*;
use types::TokenId;

#[test]
fn test_repository_config_seeds_every_pool() {
    let engine = repo_engine();
    assert_eq!(engine.registry.catalog().len(), 5);
    assert_eq!(engine.registry.len(), 5);

    let stats = engine.registry.statistics();
    assert_eq!(stats.pool_count, 5);
    assert!(stats.total_value_locked_usd > dec!(1_000_000));

    let by_tvl = engine.registry.sorted_pools(PoolSort::Tvl);
    for pair in by_tvl.windows(2) {
        let catalog = engine.registry.catalog();
        assert!(pair[0].tvl_usd(catalog) >= pair[1].tvl_usd(catalog));
    }

    let weth = TokenId::new("weth");
    let weth_pools = engine.registry.pools_with_token(&weth);
    assert_eq!(weth_pools.len(), 2);
}

#[test]
fn test_quote_and_settle_every_seeded_pair() {
    let mut engine = repo_engine();
    let pairs: Vec<(TokenId, TokenId)> = engine
        .registry
        .list_pools()
        .iter()
        .map(|pool| (pool.token_a.clone(), pool.token_b.clone()))
        .collect();

    for (a, b) in pairs {
        let token = engine.registry.token(&a).unwrap().clone();
        let amount = token.parse_amount("0.01").unwrap();
        let quote = engine
            .orchestrator
            .get_quote(&engine.registry, &a, &b, amount, &engine.slippage)
            .unwrap()
            .unwrap();
        assert!(quote.output_amount > 0, "{a}/{b} quoted nothing");

        let outcome =
            SwapOutcome::from(engine.orchestrator.execute_swap(&mut engine.registry, &quote));
        assert!(outcome.success, "{a}/{b}: {:?}", outcome.error_message);
        assert!(outcome.settlement_handle.unwrap().starts_with("0x"));
    }
    assert_eq!(engine.registry.statistics().pool_count, 5);
}

#[test]
fn test_environment_overlay_changes_engine_settings() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("tidepool.toml");
    std::fs::copy(repo_config_path(), &base).unwrap();
    std::fs::create_dir(dir.path().join("environments")).unwrap();
    std::fs::write(
        dir.path().join("environments/strict.toml"),
        "[engine]\ndefault_slippage_bps = 10\nauto_slippage = true\n",
    )
    .unwrap();

    let config = EngineConfig::load(Some(&base), Some("strict")).unwrap();
    let engine = Engine::from_config(&config).unwrap();
    assert_eq!(engine.slippage.tolerance.value(), 10);
    assert!(engine.slippage.auto);
    assert_eq!(engine.orchestrator.settings().default_slippage.value(), 10);
}

#[test]
fn test_locked_host_serialises_concurrent_swaps() {
    let (registry, pool_id) = reference_registry();
    let shared = Arc::new(RwLock::new(registry));
    let orchestrator = Arc::new(parking_lot::Mutex::new(swap_service::SwapOrchestrator::default()));
    let k_before = {
        let registry = shared.read();
        let (a, b) = registry.get_pool(pool_id).unwrap().reserves();
        types::wide_mul(a, b)
    };

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let shared = Arc::clone(&shared);
            let orchestrator = Arc::clone(&orchestrator);
            thread::spawn(move || {
                let (input, output) = if worker % 2 == 0 {
                    (sui(), usdc())
                } else {
                    (usdc(), sui())
                };
                let amount = if worker % 2 == 0 { 100_000_000 } else { 245_000 };
                let mut settled = 0u32;
                for _ in 0..25 {
                    // Quote and settle under one write lock so no other writer interleaves
                    let mut registry = shared.write();
                    let mut orchestrator = orchestrator.lock();
                    let quote = orchestrator
                        .get_quote(&registry, &input, &output, amount, &SlippageSettings::default())
                        .unwrap()
                        .unwrap();
                    match orchestrator.execute_swap(&mut registry, &quote) {
                        Ok(_) => settled += 1,
                        Err(SwapError::SlippageExceeded { .. }) => {
                            panic!("no writer can move the pool between quote and settle")
                        }
                        Err(other) => panic!("unexpected error {other}"),
                    }
                }
                settled
            })
        })
        .collect();

    let settled: u32 = handles.into_iter().map(|handle| handle.join().unwrap()).sum();
    assert_eq!(settled, 200);

    let registry = shared.read();
    let pool = registry.get_pool(pool_id).unwrap();
    assert_eq!(pool.stats().swap_count, 200);
    let (a, b) = pool.reserves();
    assert!(types::wide_mul(a, b) >= k_before);
}

#[test]
fn test_config_snapshot_serialises() {
    let engine = repo_engine();
    let json = serde_json::to_value(engine.registry.list_pools()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 5);
    assert_eq!(json[1]["curve"]["type"], "stable_swap");
}

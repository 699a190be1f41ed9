//! # Tidepool End-to-End Test Fixtures
//!
//! Shared catalogs, registries and proptest strategies for the suites under
//! `tests/`. Amounts are smallest units throughout.

use amm::CurveType;
use proptest::prelude::*;
use rust_decimal_macros::dec;
use state_pool::PoolRegistry;
use std::path::PathBuf;
use swap_service::Engine;
use tidepool_config::EngineConfig;
use types::{BasisPoints, PoolId, Token, TokenCatalog, TokenId};

pub const SUI_RESERVE: u128 = 100_000_000_000;
pub const USDC_RESERVE: u128 = 245_000_000;

pub fn sui() -> TokenId {
    TokenId::new("sui")
}

pub fn usdc() -> TokenId {
    TokenId::new("usdc")
}

pub fn usdt() -> TokenId {
    TokenId::new("usdt")
}

/// SUI, USDC and USDT at demo reference prices
pub fn catalog() -> TokenCatalog {
    TokenCatalog::from_tokens(vec![
        Token::new("sui", "SUI", "Sui", 9).with_price(dec!(2.45)),
        Token::new("usdc", "USDC", "USD Coin", 6).with_price(dec!(1)),
        Token::new("usdt", "USDT", "Tether USD", 6).with_price(dec!(1)),
    ])
    .expect("fixture catalog is valid")
}

/// Registry with the 100 SUI / 245 USDC reference pool at 30 bps
pub fn reference_registry() -> (PoolRegistry, PoolId) {
    constant_product_registry(SUI_RESERVE, USDC_RESERVE, BasisPoints::MEDIUM)
}

pub fn constant_product_registry(
    reserve_a: u128,
    reserve_b: u128,
    fee: BasisPoints,
) -> (PoolRegistry, PoolId) {
    let mut registry = PoolRegistry::new(catalog());
    let id = registry
        .create_pool(&sui(), &usdc(), reserve_a, reserve_b, fee, CurveType::ConstantProduct)
        .expect("fixture pool is valid")
        .id;
    (registry, id)
}

/// Registry with a USDC/USDT stable pool
pub fn stable_registry(
    reserve_a: u128,
    reserve_b: u128,
    amplification: u32,
) -> (PoolRegistry, PoolId) {
    let mut registry = PoolRegistry::new(catalog());
    let id = registry
        .create_pool(
            &usdc(),
            &usdt(),
            reserve_a,
            reserve_b,
            BasisPoints::LOW,
            CurveType::StableSwap { amplification },
        )
        .expect("fixture pool is valid")
        .id;
    (registry, id)
}

/// The configuration shipped in the repository's `config/` directory
pub fn repo_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../config/tidepool.toml")
}

pub fn repo_engine() -> Engine {
    let config = EngineConfig::load(Some(&repo_config_path()), None)
        .expect("repository configuration loads");
    Engine::from_config(&config).expect("repository configuration seeds")
}

/// Reserves deep enough that small trades quote a non-zero output
pub fn reserve_strategy() -> impl Strategy<Value = u128> {
    1_000_000u128..1_000_000_000_000_000
}

pub fn fee_strategy() -> impl Strategy<Value = BasisPoints> {
    prop_oneof![
        Just(BasisPoints::ZERO),
        Just(BasisPoints::LOW),
        Just(BasisPoints::MEDIUM),
        Just(BasisPoints::HIGH),
        (0u32..1_000).prop_map(|bps| BasisPoints::new(bps).expect("below 10000")),
    ]
}

//! # Swap Service
//!
//! Quoting and settlement over the pool registry, plus the engine assembly
//! used by hosts such as the `tidepool-demo` binary.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use swap_service::Engine;
//! use types::TokenId;
//!
//! let config = tidepool_config::load_config(None).unwrap();
//! let mut engine = Engine::from_config(&config).unwrap();
//! let quote = engine
//!     .orchestrator
//!     .get_quote(
//!         &engine.registry,
//!         &TokenId::new("sui"),
//!         &TokenId::new("usdc"),
//!         1_000_000_000,
//!         &engine.slippage,
//!     )
//!     .unwrap();
//! if let Some(quote) = quote {
//!     let settlement = engine.orchestrator.execute_swap(&mut engine.registry, &quote);
//!     println!("{:?}", settlement);
//! }
//! ```

pub mod bootstrap;
pub mod error;
pub mod orchestrator;
pub mod quote;

pub use bootstrap::Engine;
pub use error::{Result, SwapError};
pub use orchestrator::{OrchestratorSettings, SwapOrchestrator};
pub use quote::{
    ImpactThresholds, PriceImpactSeverity, PriceImpactWarning, SlippageSettings, SwapOutcome,
    SwapQuote, SwapSettlement,
};

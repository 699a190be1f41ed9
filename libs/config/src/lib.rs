//! # Tidepool Engine Configuration
//!
//! Settings and seed data for the Tidepool engine, loaded once by the host
//! and handed to the registry, ledger and orchestrator.
//!
//! ## Sources (later wins)
//!
//! 1. `config/tidepool.toml` (or the path given to [`EngineConfig::load`])
//! 2. `config/environments/<env>.toml` next to it, when an environment is named
//! 3. `TIDEPOOL_` environment variables, `__` separating sections
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tidepool_config::load_config;
//!
//! let config = load_config(Some("development")).unwrap();
//! let tolerance = config.engine.ratio_tolerance().unwrap();
//! let catalog = config.token_catalog().unwrap();
//! ```

pub mod defaults;
pub mod engine_config;

// Re-export commonly used types
pub use engine_config::{
    load_config, resolve_config_path, CurveKind, EngineConfig, EngineSettings, PoolSeed,
};

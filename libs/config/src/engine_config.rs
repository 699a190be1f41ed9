//! Engine Configuration Module
//!
//! Loads engine settings and the seed token/pool catalog from TOML with
//! environment-specific overrides and `TIDEPOOL_` environment variables.

use crate::defaults;
use amm::CurveType;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use types::{BasisPoints, Decimal, Token, TokenCatalog, TokenId};

/// Main engine configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct EngineConfig {
    /// Engine-wide settings
    #[serde(default)]
    pub engine: EngineSettings,

    /// Seed token catalog
    #[serde(default)]
    pub tokens: Vec<Token>,

    /// Pools created when the host starts
    #[serde(default)]
    pub pools: Vec<PoolSeed>,
}

/// Engine-wide settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EngineSettings {
    pub ratio_tolerance_bps: u32,
    pub fee_lookback_multiplier: u32,
    pub default_slippage_bps: u32,
    pub default_deadline_secs: u64,
    pub auto_slippage: bool,
    /// Medium, high and critical price-impact boundaries in percent
    pub price_impact_thresholds: [f64; 3],
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            ratio_tolerance_bps: defaults::ledger::RATIO_TOLERANCE_BPS,
            fee_lookback_multiplier: defaults::ledger::FEE_LOOKBACK_MULTIPLIER,
            default_slippage_bps: defaults::swap::SLIPPAGE_BPS,
            default_deadline_secs: defaults::swap::DEADLINE_SECS,
            auto_slippage: false,
            price_impact_thresholds: defaults::swap::PRICE_IMPACT_THRESHOLDS,
            log_level: defaults::logging::LEVEL.to_string(),
            json_logs: false,
        }
    }
}

impl EngineSettings {
    pub fn ratio_tolerance(&self) -> Result<BasisPoints> {
        BasisPoints::new(self.ratio_tolerance_bps).context("Invalid engine.ratio_tolerance_bps")
    }

    pub fn default_slippage(&self) -> Result<BasisPoints> {
        BasisPoints::new(self.default_slippage_bps).context("Invalid engine.default_slippage_bps")
    }
}

/// Curve family as written in configuration files
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    #[default]
    ConstantProduct,
    StableSwap,
}

/// A pool to register at startup
///
/// Amounts are smallest units written as strings so 18-decimal reserves
/// survive TOML's 64-bit integers.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PoolSeed {
    pub token_a: TokenId,
    pub token_b: TokenId,
    #[serde(with = "amount_text")]
    pub reserve_a: u128,
    #[serde(with = "amount_text")]
    pub reserve_b: u128,
    /// Outstanding receipts; the geometric mean of the reserves when omitted
    #[serde(default, with = "optional_amount_text")]
    pub total_liquidity: Option<u128>,
    pub fee_bps: u32,
    #[serde(default)]
    pub curve: CurveKind,
    #[serde(default)]
    pub amplification: Option<u32>,
    #[serde(default)]
    pub volume_24h_usd: Decimal,
    #[serde(default)]
    pub volume_7d_usd: Decimal,
    #[serde(default)]
    pub fees_24h_usd: Decimal,
    #[serde(default)]
    pub swap_count: u64,
    /// Pool age at startup, used to backdate its creation time
    #[serde(default)]
    pub age_days: u64,
}

impl PoolSeed {
    pub fn fee(&self) -> Result<BasisPoints> {
        BasisPoints::new(self.fee_bps)
            .with_context(|| format!("Invalid fee for pool {}/{}", self.token_a, self.token_b))
    }

    pub fn curve_type(&self) -> Result<CurveType> {
        match (self.curve, self.amplification) {
            (CurveKind::ConstantProduct, _) => Ok(CurveType::ConstantProduct),
            (CurveKind::StableSwap, Some(amplification)) if amplification > 0 => {
                Ok(CurveType::StableSwap { amplification })
            }
            (CurveKind::StableSwap, _) => bail!(
                "Stable-swap pool {}/{} needs a positive amplification",
                self.token_a,
                self.token_b
            ),
        }
    }
}

impl EngineConfig {
    /// Load configuration from files with environment overrides
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(defaults::CONFIG_PATH));

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        // Add environment-specific overrides if specified
        if let Some(env) = environment {
            let env_file = base
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
                .join("environments")
                .join(format!("{env}.toml"));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (TIDEPOOL_ENGINE__LOG_LEVEL=debug)
        builder = builder.add_source(
            Environment::with_prefix(defaults::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        debug!(
            tokens = config.tokens.len(),
            pools = config.pools.len(),
            "Engine configuration loaded"
        );
        Ok(config)
    }

    /// Check cross-references and ranges the type system cannot express
    pub fn validate(&self) -> Result<()> {
        self.engine.ratio_tolerance()?;
        self.engine.default_slippage()?;

        let [medium, high, critical] = self.engine.price_impact_thresholds;
        if !(medium > 0.0 && medium < high && high < critical) {
            bail!(
                "engine.price_impact_thresholds must be positive and ascending, got {:?}",
                self.engine.price_impact_thresholds
            );
        }

        let catalog = self.token_catalog()?;
        for seed in &self.pools {
            seed.fee()?;
            seed.curve_type()?;
            for token in [&seed.token_a, &seed.token_b] {
                if catalog.get(token).is_none() {
                    bail!("Pool seed references unknown token '{token}'");
                }
            }
            if seed.token_a == seed.token_b {
                bail!("Pool seed pairs '{}' with itself", seed.token_a);
            }
            if seed.reserve_a == 0 || seed.reserve_b == 0 {
                bail!("Pool seed {}/{} has an empty reserve", seed.token_a, seed.token_b);
            }
        }
        Ok(())
    }

    /// Build the token catalog from the configured tokens
    pub fn token_catalog(&self) -> Result<TokenCatalog> {
        TokenCatalog::from_tokens(self.tokens.iter().cloned()).context("Invalid token catalog")
    }

    /// Render as TOML, e.g. to write a starter file
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Convenience function to load configuration from the default location
pub fn load_config(environment: Option<&str>) -> Result<EngineConfig> {
    EngineConfig::load(None, environment)
}

/// Resolve a config path given on the command line, falling back to the default
pub fn resolve_config_path(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| PathBuf::from(defaults::CONFIG_PATH))
}

mod amount_text {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    pub(super) enum RawAmount {
        Text(String),
        Integer(u64),
    }

    impl RawAmount {
        pub(super) fn into_amount<E: de::Error>(self) -> Result<u128, E> {
            match self {
                RawAmount::Text(text) => text
                    .trim()
                    .replace('_', "")
                    .parse::<u128>()
                    .map_err(|_| E::custom(format!("invalid amount '{text}'"))),
                RawAmount::Integer(value) => Ok(value as u128),
            }
        }
    }

    pub fn serialize<S: Serializer>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        RawAmount::deserialize(deserializer)?.into_amount()
    }
}

mod optional_amount_text {
    use super::amount_text::RawAmount;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        amount: &Option<u128>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match amount {
            Some(value) => serializer.serialize_str(&value.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u128>, D::Error> {
        Option::<RawAmount>::deserialize(deserializer)?
            .map(RawAmount::into_amount)
            .transpose()
    }
}

//! Tidepool demo host
//!
//! Seeds an in-memory engine from configuration and runs one command
//! against it. State lives only for the process.

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use serde::Serialize;
use state_pool::{Pool, PoolRegistry, PoolSort, RegistryStatistics};
use std::path::PathBuf;
use swap_service::{Engine, SlippageSettings, SwapOutcome, SwapQuote};
use tidepool_config::{resolve_config_path, EngineConfig};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use types::{BasisPoints, Decimal, Token, TokenId};

#[derive(Parser, Debug)]
#[command(name = "tidepool-demo", author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment overlay (config/environments/<env>.toml)
    #[arg(short, long)]
    env: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List pools
    Pools {
        /// Ordering: tvl, volume or apr
        #[arg(long)]
        sort: Option<PoolSort>,

        /// Only pools containing this token
        #[arg(long)]
        token: Option<String>,
    },

    /// Price a swap without settling it
    Quote {
        input: String,
        output: String,
        /// Display-unit amount, e.g. 1.5
        amount: String,

        /// Treat the amount as the desired output
        #[arg(long)]
        reverse: bool,

        #[arg(long)]
        slippage_bps: Option<u32>,
    },

    /// Quote and settle a swap
    Swap {
        input: String,
        output: String,
        amount: String,

        #[arg(long)]
        slippage_bps: Option<u32>,
    },

    /// Deposit at the pool ratio, show the position, optionally withdraw part of it
    Liquidity {
        token_a: String,
        token_b: String,
        /// Display-unit amount of token A; token B is matched to the pool ratio
        amount_a: String,

        /// Percentage of the receipts to withdraw afterwards
        #[arg(long)]
        withdraw_percent: Option<u8>,
    },

    /// Aggregate pool statistics
    Stats,

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let path = resolve_config_path(args.config.clone());
    let config = EngineConfig::load(Some(&path), args.env.as_deref())
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    init_tracing(&config.engine.log_level, config.engine.json_logs);

    info!(config = %path.display(), env = ?args.env, "Starting Tidepool demo host");
    let mut engine = Engine::from_config(&config)?;

    match args.command {
        Command::Pools { sort, token } => {
            let pools: Vec<&Pool> = match sort {
                Some(sort) => engine.registry.sorted_pools(sort),
                None => engine.registry.list_pools().iter().collect(),
            };
            let token = token.map(TokenId::new);
            let views: Vec<PoolView> = pools
                .into_iter()
                .filter(|pool| token.as_ref().map_or(true, |token| pool.contains(token)))
                .map(|pool| PoolView::new(&engine.registry, pool))
                .collect();
            if args.json {
                print_json(&views)?;
            } else {
                for view in &views {
                    println!("{view}");
                }
            }
        }

        Command::Quote {
            input,
            output,
            amount,
            reverse,
            slippage_bps,
        } => {
            let (input, output) = (TokenId::new(input), TokenId::new(output));
            let slippage = slippage_for(&engine, slippage_bps)?;
            let amount_token = if reverse { &output } else { &input };
            let amount = parse_amount(&engine.registry, amount_token, &amount)?;

            let quote = if reverse {
                engine
                    .orchestrator
                    .reverse_quote(&engine.registry, &input, &output, amount, &slippage)?
            } else {
                engine
                    .orchestrator
                    .get_quote(&engine.registry, &input, &output, amount, &slippage)?
            };
            let Some(quote) = quote else {
                bail!("No pool trades {input}/{output}");
            };
            print_quote(&engine, &quote, args.json)?;
        }

        Command::Swap {
            input,
            output,
            amount,
            slippage_bps,
        } => {
            let (input, output) = (TokenId::new(input), TokenId::new(output));
            let slippage = slippage_for(&engine, slippage_bps)?;
            let amount = parse_amount(&engine.registry, &input, &amount)?;
            let Some(quote) = engine
                .orchestrator
                .get_quote(&engine.registry, &input, &output, amount, &slippage)?
            else {
                bail!("No pool trades {input}/{output}");
            };
            print_quote(&engine, &quote, args.json)?;

            let result = engine.orchestrator.execute_swap(&mut engine.registry, &quote);
            if let Err(err) = &result {
                warn!(error = %err, "Swap failed");
            }
            let outcome = SwapOutcome::from(result);
            if args.json {
                print_json(&outcome)?;
            } else if let Some(handle) = &outcome.settlement_handle {
                println!("settled {handle}");
            } else {
                println!(
                    "failed: {}",
                    outcome.error_message.as_deref().unwrap_or("unknown error")
                );
            }
        }

        Command::Liquidity {
            token_a,
            token_b,
            amount_a,
            withdraw_percent,
        } => run_liquidity(
            &mut engine,
            &TokenId::new(token_a),
            &TokenId::new(token_b),
            &amount_a,
            withdraw_percent,
            args.json,
        )?,

        Command::Stats => {
            let stats: RegistryStatistics = engine.registry.statistics();
            if args.json {
                print_json(&stats)?;
            } else {
                println!("pools:       {}", stats.pool_count);
                println!("tvl:         ${}", stats.total_value_locked_usd.round_dp(2));
                println!("volume 24h:  ${}", stats.volume_24h_usd.round_dp(2));
                println!("fees 24h:    ${}", stats.fees_24h_usd.round_dp(2));
                println!("swaps:       {}", stats.swap_count);
            }
        }

        Command::Config => print!("{}", config.to_toml_string()?),
    }

    Ok(())
}

/// Console (or JSON) logging to stderr; `RUST_LOG` overrides the configured level
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run_liquidity(
    engine: &mut Engine,
    token_a: &TokenId,
    token_b: &TokenId,
    amount_a: &str,
    withdraw_percent: Option<u8>,
    json: bool,
) -> Result<()> {
    let pool = engine
        .registry
        .find_pool(token_a, token_b, None)
        .with_context(|| format!("No pool trades {token_a}/{token_b}"))?;
    let pool_id = pool.id;
    let input_is_a = pool.is_token_a(token_a) == Some(true);
    let (reserve_in, reserve_out) = if input_is_a {
        pool.reserves()
    } else {
        let (a, b) = pool.reserves();
        (b, a)
    };

    let amount_in = parse_amount(&engine.registry, token_a, amount_a)?;
    let amount_out = amm::liquidity::optimal_amount_b(amount_in, reserve_in, reserve_out)?;
    let (amount_a, amount_b) = if input_is_a {
        (amount_in, amount_out)
    } else {
        (amount_out, amount_in)
    };

    let deposit = engine
        .ledger
        .add_liquidity(&mut engine.registry, pool_id, amount_a, amount_b)?;
    let position_id = deposit.position.id;
    let withdrawal = match withdraw_percent {
        Some(percent) if percent > 0 => {
            let percent = u128::from(percent.min(100));
            let receipts = deposit.receipts_minted * percent / 100;
            Some(
                engine
                    .ledger
                    .remove_liquidity(&mut engine.registry, position_id, receipts.max(1))?,
            )
        }
        _ => None,
    };
    let position = engine
        .ledger
        .get_position(&engine.registry, position_id)?
        .cloned();

    if json {
        print_json(&serde_json::json!({
            "receipts_minted": deposit.receipts_minted,
            "position": position,
            "withdrawal": withdrawal,
        }))?;
        return Ok(());
    }

    println!("minted {} receipts", deposit.receipts_minted);
    match position {
        Some(position) => println!(
            "position {}: {} receipts, {:.4}% of pool, ${} value, {:.4}% IL, ${} fees",
            position.id,
            position.lp_tokens,
            position.share_percentage,
            position.value_usd.round_dp(2),
            position.impermanent_loss,
            position.fees_usd.round_dp(4),
        ),
        None => println!("position {position_id} closed"),
    }
    if let Some(withdrawal) = withdrawal {
        println!(
            "withdrew {} / {} ({:?})",
            withdrawal.amount_a, withdrawal.amount_b, withdrawal.state
        );
    }
    Ok(())
}

fn slippage_for(engine: &Engine, slippage_bps: Option<u32>) -> Result<SlippageSettings> {
    match slippage_bps {
        Some(bps) => Ok(SlippageSettings {
            tolerance: BasisPoints::new(bps).context("Invalid --slippage-bps")?,
            auto: false,
            ..engine.slippage
        }),
        None => Ok(engine.slippage),
    }
}

fn parse_amount(registry: &PoolRegistry, token: &TokenId, amount: &str) -> Result<u128> {
    let token: &Token = registry
        .token(token)
        .with_context(|| format!("Unknown token '{token}'"))?;
    token
        .parse_amount(amount)
        .with_context(|| format!("Invalid {} amount '{amount}'", token.symbol))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_quote(engine: &Engine, quote: &SwapQuote, json: bool) -> Result<()> {
    let warning = engine.orchestrator.price_impact_severity(quote.price_impact);
    if json {
        return print_json(&serde_json::json!({ "quote": quote, "warning": warning }));
    }
    let render = |token: &TokenId, amount: u128| match engine.registry.token(token) {
        Some(token) => format!("{} {}", token.format_amount(amount), token.symbol),
        None => format!("{amount} {token}"),
    };
    println!("in:        {}", render(&quote.input_token, quote.input_amount));
    println!("out:       {}", render(&quote.output_token, quote.output_amount));
    println!("minimum:   {}", render(&quote.output_token, quote.minimum_received));
    println!("fee:       {}", render(&quote.input_token, quote.fee));
    println!("price:     {:.6}", quote.execution_price);
    println!(
        "impact:    {:.3}% ({}: {})",
        quote.price_impact, warning.severity, warning.message
    );
    Ok(())
}

/// One row of the pool listing
#[derive(Debug, Serialize)]
struct PoolView {
    id: String,
    pair: String,
    curve: String,
    fee: String,
    reserve_a: String,
    reserve_b: String,
    price: Option<f64>,
    tvl_usd: Decimal,
    volume_24h_usd: Decimal,
    apr: f64,
    created_at: Option<String>,
}

impl PoolView {
    fn new(registry: &PoolRegistry, pool: &Pool) -> Self {
        let render = |token: &TokenId, amount: u128| {
            registry
                .token(token)
                .map(|token| format!("{} {}", token.format_amount(amount), token.symbol))
                .unwrap_or_else(|| amount.to_string())
        };
        let created_ns = pool.created_at_ns;
        Self {
            id: pool.id.to_string(),
            pair: format!("{}/{}", pool.token_a, pool.token_b),
            curve: pool.curve.to_string(),
            fee: pool.fee.to_string(),
            reserve_a: render(&pool.token_a, pool.reserve_a()),
            reserve_b: render(&pool.token_b, pool.reserve_b()),
            price: pool.price(registry.catalog()),
            tvl_usd: pool.tvl_usd(registry.catalog()).round_dp(2),
            volume_24h_usd: pool.stats().volume_24h_usd,
            apr: pool.apr(registry.catalog()),
            created_at: DateTime::from_timestamp(
                (created_ns / 1_000_000_000) as i64,
                (created_ns % 1_000_000_000) as u32,
            )
            .map(|created_at| created_at.format("%Y-%m-%d").to_string()),
        }
    }
}

impl std::fmt::Display for PoolView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<8} {:<10} {:<18} {:>8}  tvl ${:<14} vol ${:<12} apr {:>7.2}%  [{} | {}]",
            self.id,
            self.pair,
            self.curve,
            self.fee,
            self.tvl_usd,
            self.volume_24h_usd,
            self.apr,
            self.reserve_a,
            self.reserve_b,
        )?;
        if let Some(created_at) = &self.created_at {
            write!(f, " since {created_at}")?;
        }
        Ok(())
    }
}

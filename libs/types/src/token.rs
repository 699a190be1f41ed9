//! Token metadata and the ordered token catalog
//!
//! Tokens are configuration data: the engine reads their precision and
//! reference price but never mutates them. Amounts always travel as `u128`
//! smallest units next to the token that gives them meaning.
//!
//! ## Precision by Token (native, never normalized)
//! - **SUI**: 9 decimal places (`1 SUI = 1_000_000_000 MIST`)
//! - **USDC / USDT**: 6 decimal places (`1 USDC = 1_000_000 units`)
//! - **WETH**: 18 decimal places (`1 WETH = 10^18 wei`)
//! - **WBTC**: 8 decimal places (`1 WBTC = 100_000_000 sats`)

use crate::common::errors::{FixedPointError, ValidationError};
use crate::common::fixed_point::{self, MAX_AMOUNT_DECIMALS};
use crate::common::identifiers::TokenId;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable token description supplied by the token catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    /// Reference price used only for USD valuation
    #[serde(default)]
    pub price_usd: Option<Decimal>,
}

impl Token {
    pub fn new(id: impl Into<String>, symbol: &str, name: &str, decimals: u8) -> Self {
        Self {
            id: TokenId::new(id),
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
            price_usd: None,
        }
    }

    /// Attach a reference USD price
    pub fn with_price(mut self, price_usd: Decimal) -> Self {
        self.price_usd = Some(price_usd);
        self
    }

    /// Check the token can be used in amount arithmetic
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.as_str().is_empty() {
            return Err(ValidationError::EmptyTokenId);
        }
        if self.decimals > MAX_AMOUNT_DECIMALS {
            return Err(ValidationError::UnsupportedDecimals {
                id: self.id.to_string(),
                decimals: self.decimals,
                max: MAX_AMOUNT_DECIMALS,
            });
        }
        Ok(())
    }

    /// Parse a human amount ("1.25") into this token's smallest units
    pub fn parse_amount(&self, input: &str) -> Result<u128, FixedPointError> {
        fixed_point::parse_amount(input, self.decimals)
    }

    /// Format smallest units as a human amount
    pub fn format_amount(&self, amount: u128) -> String {
        fixed_point::format_amount(amount, self.decimals)
    }

    /// USD value of `amount` smallest units; zero when the token has no reference price
    pub fn value_usd(&self, amount: u128) -> Decimal {
        match self.price_usd {
            Some(price) => fixed_point::to_display_decimal(amount, self.decimals)
                .checked_mul(price)
                .unwrap_or(Decimal::MAX),
            None => Decimal::ZERO,
        }
    }

    /// Smallest units worth `usd` at the reference price, rounded down
    ///
    /// `None` when the token has no positive price or the result does not fit.
    pub fn amount_from_usd(&self, usd: Decimal) -> Option<u128> {
        let price = self.price_usd.filter(|price| price.is_sign_positive() && !price.is_zero())?;
        let units = fixed_point::pow10(self.decimals).ok()?;
        let scale = Decimal::try_from_i128_with_scale(i128::try_from(units).ok()?, 0).ok()?;
        usd.checked_div(price)?.checked_mul(scale)?.floor().to_u128()
    }
}

/// Ordered collection of tokens, keyed by [`TokenId`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenCatalog {
    tokens: Vec<Token>,
}

impl TokenCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, validating every token and rejecting duplicates
    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Result<Self, ValidationError> {
        let mut catalog = Self::new();
        for token in tokens {
            catalog.register(token)?;
        }
        Ok(catalog)
    }

    pub fn register(&mut self, token: Token) -> Result<(), ValidationError> {
        token.validate()?;
        if self.get(&token.id).is_some() {
            return Err(ValidationError::DuplicateToken {
                id: token.id.to_string(),
            });
        }
        self.tokens.push(token);
        Ok(())
    }

    pub fn get(&self, id: &TokenId) -> Option<&Token> {
        self.tokens.iter().find(|token| &token.id == id)
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&Token> {
        self.tokens
            .iter()
            .find(|token| token.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

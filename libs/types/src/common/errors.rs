//! Error types for fixed-point arithmetic and identifier validation
//!
//! Amount parsing, integer square roots and widened multiply-divide all report
//! through [`FixedPointError`]; catalog and identifier checks report through
//! [`ValidationError`].

use thiserror::Error;

/// Errors that can occur during token catalog and identifier validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Token identifier is empty
    #[error("Token identifier cannot be empty")]
    EmptyTokenId,

    /// Token registered twice in the same catalog
    #[error("Token '{id}' is already registered")]
    DuplicateToken { id: String },

    /// Decimal precision outside the supported range
    #[error("Token '{id}' has unsupported precision {decimals} (max {max})")]
    UnsupportedDecimals { id: String, decimals: u8, max: u8 },

    /// Basis-point value outside [0, 10000)
    #[error("Basis points {value} out of range [0, {max})")]
    BasisPointsOutOfRange { value: u32, max: u32 },

    /// Custom validation failure with message
    #[error("Validation failed: {message}")]
    Custom { message: String },
}

/// Errors that can occur during fixed-point arithmetic operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FixedPointError {
    /// Operation is undefined for the given input (e.g. square root of a negative)
    #[error("Domain error: {reason}")]
    DomainError { reason: String },

    /// Invalid decimal string format
    #[error("Invalid decimal string: '{input}' - expected unsigned numeric format")]
    InvalidDecimal { input: String },

    /// Result does not fit the 128-bit amount representation
    #[error("Overflow: {context} exceeds the representable amount range")]
    Overflow { context: &'static str },

    /// Division by zero in fixed-point arithmetic
    #[error("Division by zero in fixed-point arithmetic")]
    DivisionByZero,
}

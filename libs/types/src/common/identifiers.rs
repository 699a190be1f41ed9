//! # Typed Identifiers
//!
//! Zero-cost `u64` wrappers for engine-assigned identifiers (pools, positions,
//! settlements) plus the string-keyed [`TokenId`] supplied by the token catalog.
//!
//! Distinct types stop a pool id from being passed where a position id is
//! expected:
//!
//! ```rust
//! use types::{PoolId, PositionId};
//!
//! let pool = PoolId::new(1);
//! let position = PositionId::new(1);
//! assert_eq!(pool.to_string(), "pool-1");
//! assert_eq!(position.to_string(), "pos-1");
//! // fn close(position: PositionId) { ... }
//! // close(pool); // ❌ Compile error!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro for generating typed `u64` identifier wrappers
///
/// `$prefix` is used by `Display` so identifiers read naturally in logs
/// (`pool-3`, `pos-12`).
#[macro_export]
macro_rules! define_typed_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize
        )]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create a new typed ID
            #[inline(always)]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Extract the inner u64 value
            #[inline(always)]
            pub const fn inner(&self) -> u64 {
                self.0
            }

            /// Generate next sequential ID
            #[inline(always)]
            pub fn next(&self) -> Self {
                Self(self.0.wrapping_add(1))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl From<u64> for $name {
            #[inline(always)]
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            #[inline(always)]
            fn from(id: $name) -> u64 {
                id.0
            }
        }
    };
}

define_typed_id!(
    /// Unique identifier for a liquidity pool
    PoolId, "pool"
);

define_typed_id!(
    /// Unique identifier for a liquidity position
    PositionId, "pos"
);

define_typed_id!(
    /// Opaque handle returned for a settled swap
    SettlementId, "swap"
);

impl SettlementId {
    /// Hex rendering handed to collaborators as the settlement handle
    pub fn to_handle(self) -> String {
        format!("0x{}", hex::encode(self.0.to_be_bytes()))
    }
}

/// Catalog identifier of a token (e.g. `"sui"`, `"usdc"`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for TokenId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

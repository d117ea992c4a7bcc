//! # Error Types
//!
//! Domain-specific error types for store-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  store-core errors (this file)                                         │
//! │  └── CoreError        - Validation / pure-logic failures               │
//! │                                                                         │
//! │  store-db errors (separate crate)                                      │
//! │  └── StoreDbError     - Table read/write and lookup failures           │
//! │                                                                         │
//! │  store-server errors (app)                                             │
//! │  └── ServerError      - Protocol and connection failures               │
//! │                                                                         │
//! │  Flow: CoreError → StoreDbError → ServerError → wire "ERR ..." line    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, token, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Pure-logic errors: input validation and parsing failures.
///
/// These never involve I/O. Each variant maps to one machine-readable
/// reason token on the wire.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A monetary string could not be parsed as a 2-decimal amount.
    #[error("invalid money value: {0}")]
    InvalidMoney(String),

    /// Branch name is not one of the known branches.
    #[error("unknown branch: {0}")]
    UnknownBranch(String),

    /// Cart spec was empty or contained only blank tokens.
    #[error("cart spec is empty")]
    EmptyCart,

    /// A cart token is missing its `sku:qty` colon.
    #[error("bad cart item spec: {token}")]
    BadItemSpec { token: String },

    /// A cart quantity is not a positive integer.
    #[error("bad cart quantity: {token}")]
    BadQuantity { token: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::BadQuantity {
            token: "SKU1:zero".to_string(),
        };
        assert_eq!(err.to_string(), "bad cart quantity: SKU1:zero");

        let err = CoreError::UnknownBranch("ASHDOD".to_string());
        assert_eq!(err.to_string(), "unknown branch: ASHDOD");
    }
}

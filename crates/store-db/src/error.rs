//! # Store Error Types
//!
//! Error types for line-store table operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  I/O error (std::io::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreDbError (this module) ← Adds table/row context                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServerError (in the app)  ← Mapped to a wire "ERR ..." token          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Client sees a machine-readable reason                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use store_core::{Branch, CoreError};

/// Persistence and domain-lookup errors.
///
/// Domain variants (`SkuNotFound`, `InsufficientStock`, ...) carry enough
/// context for the wire response to name the offending SKU or id.
#[derive(Debug, Error)]
pub enum StoreDbError {
    /// Underlying table file could not be read or written.
    #[error("table I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A table row could not be parsed.
    ///
    /// ## When This Occurs
    /// - Hand-edited row with too few columns
    /// - Corrupt quantity or price cell
    #[error("malformed row in {table}: {row}")]
    MalformedRow { table: String, row: String },

    /// SKU does not exist in the given branch.
    #[error("SKU not found in {branch}: {sku}")]
    SkuNotFound { branch: Branch, sku: String },

    /// Not enough stock to commit a sale line.
    #[error("insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Customer id does not exist.
    #[error("customer not found: {0}")]
    CustomerNotFound(String),

    /// Customer id is already taken.
    #[error("customer already exists: {0}")]
    CustomerExists(String),

    /// Pure-logic error surfaced while parsing a table cell.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for store operations.
pub type StoreDbResult<T> = Result<T, StoreDbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreDbError::InsufficientStock {
            sku: "SKU1".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for SKU1: available 3, requested 5"
        );

        let err = StoreDbError::SkuNotFound {
            branch: Branch::Holon,
            sku: "SKU9".to_string(),
        };
        assert_eq!(err.to_string(), "SKU not found in HOLON: SKU9");
    }
}

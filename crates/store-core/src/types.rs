//! # Domain Types
//!
//! Core domain types used throughout the branch store server.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │    Employee     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  sku (business) │   │  id             │   │  id (E00001)    │       │
//! │  │  category       │   │  full_name      │   │  username       │       │
//! │  │  branch         │   │  phone          │   │  password_hash  │       │
//! │  │  quantity       │   │  tier           │   │  role, branch   │       │
//! │  │  price (Money)  │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │     Branch      │   │    CartLine     │  (ephemeral, one request)   │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  Holon          │   │  sku            │                             │
//! │  │  TelAviv        │   │  qty            │                             │
//! │  │  Rishon         │   │  product snap   │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::money::Money;
use crate::pricing::Tier;

// =============================================================================
// Branch
// =============================================================================

/// One of the fixed store locations.
///
/// A partition key for inventory: every product row belongs to exactly one
/// branch, and (branch, sku) is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Branch {
    Holon,
    TelAviv,
    Rishon,
}

impl Branch {
    /// The wire/file name of this branch (`HOLON`, `TEL_AVIV`, `RISHON`).
    pub const fn name(&self) -> &'static str {
        match self {
            Branch::Holon => "HOLON",
            Branch::TelAviv => "TEL_AVIV",
            Branch::Rishon => "RISHON",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive parse from the wire or the table files.
impl FromStr for Branch {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HOLON" => Ok(Branch::Holon),
            "TEL_AVIV" => Ok(Branch::TelAviv),
            "RISHON" => Ok(Branch::Rishon),
            other => Err(CoreError::UnknownBranch(other.to_string())),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A stock-keeping unit at one branch.
///
/// Invariant: `quantity` is never negative (the inventory store clamps at
/// zero on decrement).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Stock Keeping Unit - business identifier, unique within a branch.
    pub sku: String,

    /// Category name (e.g. SHIRT, HAT). Drives gift consumption.
    pub category: String,

    /// Branch this row belongs to.
    pub branch: Branch,

    /// Units on hand. Never negative.
    pub quantity: i64,

    /// Unit price.
    pub price: Money,
}

impl Product {
    /// Checks whether `quantity` units can be sold from current stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer record. Tier is derived from the purchase counter and is
/// only ever mutated by `record_purchase`, never directly by a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub tier: Tier,
}

// =============================================================================
// Employee
// =============================================================================

/// An employee row from the employees table.
///
/// `password_hash` is a lowercase-hex SHA-256 digest; plaintext passwords
/// are never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub branch: Branch,
    pub account_number: String,
    pub phone: String,
}

// =============================================================================
// Cart Line
// =============================================================================

/// One requested line of a cart, with the product snapshot resolved at
/// validation time. Request-scoped; never persisted.
#[derive(Debug, Clone)]
pub struct CartLine {
    /// Requested SKU.
    pub sku: String,

    /// Requested quantity (> 0, validated at parse time).
    pub qty: i64,

    /// Product as it looked when the cart was validated.
    pub product: Product,
}

impl CartLine {
    /// Line base amount: unit price × quantity.
    #[inline]
    pub fn base(&self) -> Money {
        self.product.price.multiply_quantity(self.qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # store-core: Pure Business Logic for the Branch Store Server
//!
//! This crate is the **heart** of the store server. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Branch Store Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 TCP clients (line protocol)                     │   │
//! │  │      LOGIN ──► LIST ──► SELL_MULTI ──► LOGOUT                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              apps/store-server (protocol layer)                 │   │
//! │  │     connection handler, session registry, audit sink            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ store-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │   sale    │  │   │
//! │  │   │  Product  │  │   Money   │  │   Tier    │  │ CartQuote │  │   │
//! │  │   │  Customer │  │ Discount  │  │ discounts │  │ cart math │  │   │
//! │  │   │  Branch   │  │   Rate    │  │  + gifts  │  │ + parsing │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO FILES • NO NETWORK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  store-db (persistence layer)                   │   │
//! │  │          line store tables, inventory, customers                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Branch, Product, Customer, CartLine)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Tier strategy: discounts and gift eligibility
//! - [`sale`] - Cart spec parsing and the cart quote calculator
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: File system and network access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use store_core::money::Money;
//! use store_core::pricing::Tier;
//!
//! // 12% VIP discount on a 310.00 base, half-up at the cent boundary
//! let base: Money = "310.00".parse().unwrap();
//! let discount = Tier::Vip.discount_for(base);
//! assert_eq!(discount.to_string(), "37.20");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod sale;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use store_core::Money` instead of
// `use store_core::money::Money`

pub use error::{CoreError, CoreResult};
pub use money::{DiscountRate, Money};
pub use pricing::Tier;
pub use sale::{parse_cart_spec, quote_cart, CartQuote, CartRequest, LineBreakdown};
pub use types::*;

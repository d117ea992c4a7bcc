//! # Pricing Strategy
//!
//! Tier-based discounting and gift eligibility.
//!
//! ## The Tier Ladder
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   purchases      tier         discount      gift shirt                  │
//! │  ───────────   ─────────     ──────────    ─────────────────────────    │
//! │      0..2        NEW            0%          never                       │
//! │      2..10       RETURNING      5%          never                       │
//! │     10..         VIP           12%          final total >= 300.00       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The variant set is closed and small, so the strategy is an enum with
//! behavior rather than a trait with one implementation per tier.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Constants
// =============================================================================

/// Purchase count at which a customer becomes RETURNING.
pub const RETURNING_THRESHOLD: i64 = 2;

/// Purchase count at which a customer becomes VIP.
pub const VIP_THRESHOLD: i64 = 10;

/// RETURNING discount: 5% in basis points.
const RETURNING_DISCOUNT_BPS: u32 = 500;

/// VIP discount: 12% in basis points.
const VIP_DISCOUNT_BPS: u32 = 1200;

/// VIP gift threshold: final total at or above this grants a gift unit.
pub const GIFT_THRESHOLD: Money = Money::from_cents(300_00);

/// Category the gift unit is consumed from.
pub const GIFT_CATEGORY: &str = "SHIRT";

// =============================================================================
// Tier
// =============================================================================

/// Customer loyalty tier. Ordered so promotion is monotonic:
/// `New < Returning < Vip`, and there is no demotion path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    #[default]
    New,
    Returning,
    Vip,
}

impl Tier {
    /// The wire/file code of this tier.
    pub const fn code(&self) -> &'static str {
        match self {
            Tier::New => "NEW",
            Tier::Returning => "RETURNING",
            Tier::Vip => "VIP",
        }
    }

    /// Parses a tier code, defaulting to NEW for unknown or empty input.
    ///
    /// Table rows are hand-editable; a bad tier cell degrades to NEW
    /// rather than poisoning the whole read.
    pub fn from_code(code: &str) -> Tier {
        match code.trim().to_ascii_uppercase().as_str() {
            "VIP" => Tier::Vip,
            "RETURNING" => Tier::Returning,
            _ => Tier::New,
        }
    }

    /// Derives the tier for a cumulative purchase count.
    pub const fn for_purchase_count(count: i64) -> Tier {
        if count >= VIP_THRESHOLD {
            Tier::Vip
        } else if count >= RETURNING_THRESHOLD {
            Tier::Returning
        } else {
            Tier::New
        }
    }

    /// The discount amount this tier earns on a base total.
    ///
    /// Never negative; the caller clamps to not exceed the base
    /// (see [`crate::sale::quote_cart`]).
    pub fn discount_for(&self, base: Money) -> Money {
        match self {
            Tier::New => Money::zero(),
            Tier::Returning => base.percentage(RETURNING_DISCOUNT_BPS),
            Tier::Vip => base.percentage(VIP_DISCOUNT_BPS),
        }
    }

    /// Whether this tier earns a gift unit at the given final total.
    pub fn gift_eligible(&self, final_total: Money) -> bool {
        match self {
            Tier::Vip => final_total >= GIFT_THRESHOLD,
            _ => false,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

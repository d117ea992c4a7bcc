//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 12% VIP discount on a 310.00 cart must be exactly 37.20,            │
//! │  and the per-line shares must add back up within one cent.             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    31000 cents × 1200 bps = 37.20 exactly, half-up at the boundary     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Policy
//! All external reporting is 2-decimal, round-half-up. Intermediate math
//! (the proportional discount rate) is carried at 8 fractional digits via
//! [`DiscountRate`] so per-line splits do not compound rounding error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::error::CoreError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate subtractions may pass through zero
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Plain display**: `Display` renders the wire format (`310.00`),
///   with no currency symbol, because the protocol is symbol-free
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies money by a quantity, saturating at the i64 bounds.
    ///
    /// Quantities are capped at parse time
    /// ([`crate::sale::MAX_LINE_QTY`]), so saturation is a backstop for
    /// hand-edited table values, never a wire-reachable state. No money
    /// operation may panic on extreme inputs.
    ///
    /// ## Example
    /// ```rust
    /// use store_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(10000); // 100.00
    /// let line_base = unit_price.multiply_quantity(2);
    /// assert_eq!(line_base.cents(), 20000); // 200.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Calculates a percentage of this amount, in basis points, half-up.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`. The `+5000` provides
    /// half-up rounding (5000/10000 = 0.5). i128 prevents overflow on
    /// large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use store_core::money::Money;
    ///
    /// let base = Money::from_cents(31000); // 310.00
    /// let discount = base.percentage(1200); // 12%
    /// assert_eq!(discount.cents(), 3720);   // 37.20
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        let cents = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Clamps this amount into `0 ..= max`.
    ///
    /// Used for the whole-cart discount: it must never be negative and
    /// never exceed the base it is subtracted from.
    pub fn clamp_to(&self, max: Money) -> Money {
        Money(self.0.clamp(0, max.0))
    }
}

// =============================================================================
// Parsing & Display
// =============================================================================

/// Parses a plain decimal amount (`"100"`, `"100.5"`, `"100.50"`).
///
/// At most two fractional digits are accepted; the table files and the
/// wire both carry 2-decimal amounts. Negative amounts are rejected
/// because no stored price or total is ever negative.
impl FromStr for Money {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad = || CoreError::InvalidMoney(s.to_string());

        let (major, minor) = match s.split_once('.') {
            Some((m, f)) => (m, f),
            None => (s, ""),
        };
        if major.is_empty() && minor.is_empty() {
            return Err(bad());
        }
        if minor.len() > 2 {
            return Err(bad());
        }

        let major: i64 = if major.is_empty() {
            0
        } else {
            major.parse().map_err(|_| bad())?
        };
        if major < 0 {
            return Err(bad());
        }

        // "100.5" means 50 cents, not 5
        let minor: i64 = if minor.is_empty() {
            0
        } else {
            let padded = format!("{minor:0<2}");
            padded.parse().map_err(|_| bad())?
        };
        if minor < 0 {
            return Err(bad());
        }

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(bad)?;
        Ok(Money(cents))
    }
}

/// Renders the wire format: plain 2-decimal, no currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

// =============================================================================
// Operator Implementations
// =============================================================================
// All saturating: money math must never panic, whatever the inputs.

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

// =============================================================================
// Discount Rate (8-digit proportional share)
// =============================================================================

/// Scale for the proportional discount rate: 8 fractional digits.
const RATE_SCALE: i128 = 100_000_000;

/// A cart-wide discount rate carried at 8 fractional digits.
///
/// ## Why Not Divide Per Line?
/// ```text
/// cart discount = 37.20 on base 310.00  →  rate = 0.12000000
///
/// line SKU1: 200.00 × 0.12000000 = 24.00
/// line SKU2: 110.00 × 0.12000000 = 13.20
///                                  ─────
///                      Σ = 37.20 = cart discount ✓
/// ```
/// Rounding the rate once (half-up, 8 digits) and applying it per line
/// keeps `Σ line_discount` within one cent per line of the cart
/// discount; rounding each division independently would not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountRate(i64);

impl DiscountRate {
    /// Zero rate (used when the cart base is zero).
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// Computes `discount / base` scaled to 8 fractional digits, half-up.
    ///
    /// Returns the zero rate when `base` is zero.
    pub fn of(discount: Money, base: Money) -> Self {
        if base.is_zero() {
            return DiscountRate::zero();
        }
        let scaled = (discount.cents() as i128 * RATE_SCALE + base.cents() as i128 / 2)
            / base.cents() as i128;
        DiscountRate(scaled as i64)
    }

    /// Applies the rate to a line base amount, half-up to cents.
    pub fn apply(&self, base: Money) -> Money {
        let cents = (base.cents() as i128 * self.0 as i128 + RATE_SCALE / 2) / RATE_SCALE;
        Money::from_cents(cents as i64)
    }

    /// Returns the raw rate scaled by 1e8 (for logging).
    #[inline]
    pub const fn scaled(&self) -> i64 {
        self.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

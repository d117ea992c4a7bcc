//! # Sale Calculator
//!
//! Pure computation for the cart transaction: parse a cart spec, turn
//! resolved lines plus a customer tier into totals, and split the cart
//! discount proportionally across lines.
//!
//! ## Where This Sits in SELL_MULTI
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   wire spec "SKU1:2,SKU2:1"                                             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   parse_cart_spec()      ← THIS MODULE (syntax only, no I/O)           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   resolve products       ← connection handler + inventory store        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   quote_cart()           ← THIS MODULE (totals, discount, per line)    │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   commit_sale()          ← inventory store (atomic all-or-nothing)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is deterministic: same lines + same tier = same quote.

use crate::error::{CoreError, CoreResult};
use crate::money::{DiscountRate, Money};
use crate::pricing::Tier;
use crate::types::CartLine;

// =============================================================================
// Cart Spec Parsing
// =============================================================================

/// Upper bound for a single requested line quantity.
///
/// Keeps `unit_price × qty` (and any sum of such lines) far away from
/// the i64 cents range, so line math can never overflow on
/// wire-supplied quantities. Anything above this is a bad quantity,
/// same as zero or negative.
pub const MAX_LINE_QTY: i64 = 1_000_000;

/// One parsed `sku:qty` token, before product resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRequest {
    pub sku: String,
    pub qty: i64,
}

/// Parses a `sku:qty,sku:qty,...` cart spec.
///
/// Syntax rules (any violation aborts the whole request):
/// - blank tokens between commas are skipped
/// - a token without a colon is `BadItemSpec`
/// - a quantity that is not a positive integer, or exceeds
///   [`MAX_LINE_QTY`], is `BadQuantity`
/// - a spec with no usable tokens at all is `EmptyCart`
pub fn parse_cart_spec(spec: &str) -> CoreResult<Vec<CartRequest>> {
    if spec.trim().is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut requests = Vec::new();
    for token in spec.split(',') {
        if token.trim().is_empty() {
            continue;
        }
        let (sku, qty) = token
            .split_once(':')
            .ok_or_else(|| CoreError::BadItemSpec {
                token: token.to_string(),
            })?;
        let sku = sku.trim();
        let qty: i64 = qty.trim().parse().map_err(|_| CoreError::BadQuantity {
            token: token.to_string(),
        })?;
        if sku.is_empty() {
            return Err(CoreError::BadItemSpec {
                token: token.to_string(),
            });
        }
        if qty <= 0 || qty > MAX_LINE_QTY {
            return Err(CoreError::BadQuantity {
                token: token.to_string(),
            });
        }
        requests.push(CartRequest {
            sku: sku.to_string(),
            qty,
        });
    }

    if requests.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    Ok(requests)
}

// =============================================================================
// Cart Quote
// =============================================================================

/// Per-line breakdown of a quoted cart, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBreakdown {
    pub sku: String,
    pub category: String,
    pub qty: i64,
    pub unit_price: Money,
    pub base: Money,
    pub discount: Money,
    pub final_total: Money,
}

/// The full quote for one cart: aggregate totals plus per-line shares.
/// Response-scoped; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartQuote {
    pub tier: Tier,
    pub base_total: Money,
    pub discount: Money,
    pub final_total: Money,
    pub gift_eligible: bool,
    pub lines: Vec<LineBreakdown>,
}

/// Quotes a cart for a customer tier.
///
/// One discount is computed for the WHOLE cart (not per line), clamped so
/// it can never exceed the base total, then redistributed per line via an
/// 8-digit proportional rate (see [`DiscountRate`]). Gift eligibility is
/// evaluated on the final total.
///
/// This function cannot fail: arithmetic on validated lines has no
/// business failure modes.
pub fn quote_cart(lines: &[CartLine], tier: Tier) -> CartQuote {
    let base_total = lines
        .iter()
        .fold(Money::zero(), |acc, line| acc + line.base());

    let discount = tier.discount_for(base_total).clamp_to(base_total);
    let final_total = base_total - discount;
    let gift_eligible = tier.gift_eligible(final_total);

    let rate = DiscountRate::of(discount, base_total);
    let lines = lines
        .iter()
        .map(|line| {
            let base = line.base();
            let line_discount = rate.apply(base);
            LineBreakdown {
                sku: line.sku.clone(),
                category: line.product.category.clone(),
                qty: line.qty,
                unit_price: line.product.price,
                base,
                discount: line_discount,
                final_total: base - line_discount,
            }
        })
        .collect();

    CartQuote {
        tier,
        base_total,
        discount,
        final_total,
        gift_eligible,
        lines,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Branch, Product};

    fn product(sku: &str, category: &str, price_cents: i64) -> Product {
        Product {
            sku: sku.to_string(),
            category: category.to_string(),
            branch: Branch::Holon,
            quantity: 100,
            price: Money::from_cents(price_cents),
        }
    }

    fn line(sku: &str, category: &str, price_cents: i64, qty: i64) -> CartLine {
        CartLine {
            sku: sku.to_string(),
            qty,
            product: product(sku, category, price_cents),
        }
    }

    // -------------------------------------------------------------------------
    // parse_cart_spec
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_spec_happy_path() {
        let reqs = parse_cart_spec("SKU1:2,SKU2:1").unwrap();
        assert_eq!(
            reqs,
            vec![
                CartRequest {
                    sku: "SKU1".into(),
                    qty: 2
                },
                CartRequest {
                    sku: "SKU2".into(),
                    qty: 1
                },
            ]
        );
    }

    #[test]
    fn test_parse_spec_skips_blank_tokens() {
        let reqs = parse_cart_spec("SKU1:2,,SKU2:1,").unwrap();
        assert_eq!(reqs.len(), 2);
    }

    #[test]
    fn test_parse_spec_trims_whitespace() {
        let reqs = parse_cart_spec(" SKU1 : 2 ").unwrap();
        assert_eq!(reqs[0].sku, "SKU1");
        assert_eq!(reqs[0].qty, 2);
    }

    #[test]
    fn test_parse_spec_rejects_missing_colon() {
        assert!(matches!(
            parse_cart_spec("SKU1-2"),
            Err(CoreError::BadItemSpec { .. })
        ));
    }

    #[test]
    fn test_parse_spec_rejects_bad_quantity() {
        assert!(matches!(
            parse_cart_spec("SKU1:two"),
            Err(CoreError::BadQuantity { .. })
        ));
        assert!(matches!(
            parse_cart_spec("SKU1:0"),
            Err(CoreError::BadQuantity { .. })
        ));
        assert!(matches!(
            parse_cart_spec("SKU1:-3"),
            Err(CoreError::BadQuantity { .. })
        ));
    }

    #[test]
    fn test_parse_spec_rejects_quantity_above_cap() {
        assert!(parse_cart_spec(&format!("SKU1:{MAX_LINE_QTY}")).is_ok());
        assert!(matches!(
            parse_cart_spec(&format!("SKU1:{}", MAX_LINE_QTY + 1)),
            Err(CoreError::BadQuantity { .. })
        ));
        assert!(matches!(
            parse_cart_spec("SKU1:92233720368547758"),
            Err(CoreError::BadQuantity { .. })
        ));
    }

    #[test]
    fn test_parse_spec_rejects_empty() {
        assert_eq!(parse_cart_spec(""), Err(CoreError::EmptyCart));
        assert_eq!(parse_cart_spec("  "), Err(CoreError::EmptyCart));
        assert_eq!(parse_cart_spec(",,,"), Err(CoreError::EmptyCart));
    }

    #[test]
    fn test_parse_spec_fails_fast_on_first_bad_token() {
        // the second token is malformed; the third is never reached
        let err = parse_cart_spec("SKU1:1,broken,SKU3:-1").unwrap_err();
        assert!(matches!(err, CoreError::BadItemSpec { ref token } if token == "broken"));
    }

    // -------------------------------------------------------------------------
    // quote_cart - tier pricing examples
    // -------------------------------------------------------------------------

    #[test]
    fn test_quote_new_customer_no_discount() {
        // NEW, base 100.00 -> discount 0.00, final 100.00, no gift
        let lines = [line("SKU1", "SHIRT", 10000, 1)];
        let quote = quote_cart(&lines, Tier::New);
        assert_eq!(quote.base_total.cents(), 10000);
        assert_eq!(quote.discount.cents(), 0);
        assert_eq!(quote.final_total.cents(), 10000);
        assert!(!quote.gift_eligible);
        assert_eq!(quote.lines[0].discount.cents(), 0);
        assert_eq!(quote.lines[0].final_total.cents(), 10000);
    }

    #[test]
    fn test_quote_vip_310_no_gift() {
        // VIP, base 310.00 -> discount 37.20, final 272.80 < 300 -> no gift
        let lines = [line("SKU1", "SHIRT", 10000, 2), line("SKU2", "HAT", 11000, 1)];
        let quote = quote_cart(&lines, Tier::Vip);
        assert_eq!(quote.base_total.cents(), 31000);
        assert_eq!(quote.discount.cents(), 3720);
        assert_eq!(quote.final_total.cents(), 27280);
        assert!(!quote.gift_eligible);

        // proportional per-line shares
        assert_eq!(quote.lines[0].base.cents(), 20000);
        assert_eq!(quote.lines[0].discount.cents(), 2400);
        assert_eq!(quote.lines[0].final_total.cents(), 17600);
        assert_eq!(quote.lines[1].base.cents(), 11000);
        assert_eq!(quote.lines[1].discount.cents(), 1320);
        assert_eq!(quote.lines[1].final_total.cents(), 9680);
    }

    #[test]
    fn test_quote_vip_400_gift_eligible() {
        // VIP, base 400.00 -> discount 48.00, final 352.00 >= 300 -> gift
        let lines = [line("SKU1", "SHIRT", 20000, 2)];
        let quote = quote_cart(&lines, Tier::Vip);
        assert_eq!(quote.discount.cents(), 4800);
        assert_eq!(quote.final_total.cents(), 35200);
        assert!(quote.gift_eligible);
    }

    #[test]
    fn test_quote_returning_five_percent() {
        let lines = [line("SKU1", "HAT", 5000, 2)]; // base 100.00
        let quote = quote_cart(&lines, Tier::Returning);
        assert_eq!(quote.discount.cents(), 500);
        assert_eq!(quote.final_total.cents(), 9500);
    }

    #[test]
    fn test_quote_empty_lines_is_all_zero() {
        let quote = quote_cart(&[], Tier::Vip);
        assert!(quote.base_total.is_zero());
        assert!(quote.discount.is_zero());
        assert!(quote.final_total.is_zero());
        assert!(!quote.gift_eligible);
        assert!(quote.lines.is_empty());
    }

    #[test]
    fn test_quote_extreme_quantity_never_panics() {
        // Line quantities beyond the parse cap can only come from code
        // building CartLines directly; the quote must stay total and
        // ordered (saturated, not wrapped) even then.
        let lines = [line("SKU1", "SHIRT", 10000, i64::MAX / 100)];
        let quote = quote_cart(&lines, Tier::Vip);
        assert!(quote.base_total.cents() > 0);
        assert!(quote.discount.cents() <= quote.base_total.cents());
        assert_eq!(quote.final_total, quote.base_total - quote.discount);
    }

    #[test]
    fn test_per_line_discounts_sum_to_cart_discount() {
        // uneven prices that force rounding in the proportional split
        let lines = [
            line("A", "SHIRT", 3333, 1),
            line("B", "HAT", 4199, 3),
            line("C", "SOCKS", 107, 7),
        ];
        for tier in [Tier::New, Tier::Returning, Tier::Vip] {
            let quote = quote_cart(&lines, tier);
            let sum: i64 = quote.lines.iter().map(|l| l.discount.cents()).sum();
            let tolerance = quote.lines.len() as i64; // ±0.01 per line
            assert!(
                (sum - quote.discount.cents()).abs() <= tolerance,
                "tier {tier}: per-line sum {sum} vs cart discount {}",
                quote.discount.cents()
            );
        }
    }

    #[test]
    fn test_line_final_equals_base_minus_discount() {
        let lines = [line("A", "SHIRT", 9999, 3), line("B", "HAT", 12345, 2)];
        let quote = quote_cart(&lines, Tier::Vip);
        for l in &quote.lines {
            assert_eq!(l.final_total, l.base - l.discount);
        }
    }
}

//! # Pricing Engine
//!
//! Turns reserved line items into order totals.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. subtotal  = Σ line item unit prices                                 │
//! │  2. discount  = subtotal × code rate, capped at $100.00                 │
//! │                 (unknown code → $0.00, not an error)                    │
//! │  3. tax       = (subtotal − discount) × jurisdiction rate               │
//! │                 (CA 8%, everywhere else 6%)                             │
//! │  4. shipping  = standard $9.99 / express $25.99                         │
//! │                 subtotal > $75.00 → $0.00 / $15.99                      │
//! │  5. total     = subtotal − discount + tax + shipping                    │
//! │  6. reject    total < $0.01 (degenerate) or total > $10,000 (limit)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use batchline_core::money::Money;
//! use batchline_core::pricing::PricingEngine;
//! use batchline_core::types::{LineItem, Product};
//!
//! let items = vec![LineItem::from_product(&Product::new("P1", "Lamp", Money::from_cents(5000)))];
//! let totals = PricingEngine::default().price(&items, Some("SAVE20"), "NY", true).unwrap();
//!
//! assert_eq!(totals.discount_amount.cents(), 1000);
//! assert_eq!(totals.tax_amount.cents(), 240);
//! assert_eq!(totals.shipping_cost.cents(), 2599);
//! assert_eq!(totals.total.cents(), 6839);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::PricingRejection;
use crate::money::Money;
use crate::rules::{
    BracketTable, DEFAULT_JURISDICTION_TAX, DISCOUNT_CODES, EXPRESS_SHIPPING, JURISDICTION_TAX,
    MAX_DISCOUNT, MAX_ORDER_TOTAL, MIN_ORDER_TOTAL, STANDARD_SHIPPING,
};
use crate::types::{LineItem, Rate};

// =============================================================================
// Rules
// =============================================================================

/// The tables a pricing engine reads. `Default` is the standard rule set.
#[derive(Debug, Clone, Copy)]
pub struct PricingRules {
    pub discount_codes: &'static [(&'static str, Rate)],
    pub max_discount: Money,
    pub jurisdiction_tax: &'static [(&'static str, Rate)],
    pub default_tax: Rate,
    pub standard_shipping: BracketTable<i64, Money>,
    pub express_shipping: BracketTable<i64, Money>,
    pub min_total: Money,
    pub max_total: Money,
}

impl Default for PricingRules {
    fn default() -> Self {
        PricingRules {
            discount_codes: DISCOUNT_CODES,
            max_discount: MAX_DISCOUNT,
            jurisdiction_tax: JURISDICTION_TAX,
            default_tax: DEFAULT_JURISDICTION_TAX,
            standard_shipping: STANDARD_SHIPPING,
            express_shipping: EXPRESS_SHIPPING,
            min_total: MIN_ORDER_TOTAL,
            max_total: MAX_ORDER_TOTAL,
        }
    }
}

// =============================================================================
// Totals
// =============================================================================

/// The monetary breakdown of a priced order.
///
/// Only [`PricingEngine::price`] constructs this, which guarantees
/// `total == subtotal - discount_amount + tax_amount + shipping_cost` and
/// `min_total <= total <= max_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedTotals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub tax_rate: Rate,
    pub tax_amount: Money,
    pub shipping_cost: Money,
    pub total: Money,
}

// =============================================================================
// Engine
// =============================================================================

/// Stateless order pricing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine {
    rules: PricingRules,
}

impl PricingEngine {
    pub fn new(rules: PricingRules) -> Self {
        PricingEngine { rules }
    }

    pub fn rules(&self) -> &PricingRules {
        &self.rules
    }

    /// Rate for a discount code; exact, case-sensitive match.
    pub fn discount_rate(&self, code: &str) -> Option<Rate> {
        self.rules
            .discount_codes
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, rate)| *rate)
    }

    /// Sales tax rate for a jurisdiction.
    pub fn tax_rate(&self, jurisdiction: &str) -> Rate {
        self.rules
            .jurisdiction_tax
            .iter()
            .find(|(code, _)| *code == jurisdiction)
            .map(|(_, rate)| *rate)
            .unwrap_or(self.rules.default_tax)
    }

    /// Shipping cost for a subtotal.
    pub fn shipping_cost(&self, subtotal: Money, express: bool) -> Money {
        let table = if express {
            &self.rules.express_shipping
        } else {
            &self.rules.standard_shipping
        };
        table.lookup(subtotal.cents())
    }

    /// Prices a set of reserved line items.
    ///
    /// On rejection no totals are produced; the caller releases whatever it
    /// reserved for these items.
    pub fn price(
        &self,
        line_items: &[LineItem],
        discount_code: Option<&str>,
        jurisdiction: &str,
        express_shipping: bool,
    ) -> Result<PricedTotals, PricingRejection> {
        let overflow = PricingRejection::AmountOverflow {
            max: self.rules.max_total,
        };

        let subtotal = line_items
            .iter()
            .map(LineItem::unit_price)
            .try_fold(Money::zero(), Money::checked_add)
            .ok_or(overflow.clone())?;

        let discount_amount = match discount_code.and_then(|code| self.discount_rate(code)) {
            Some(rate) => subtotal
                .checked_apply_rate(rate)
                .ok_or(overflow.clone())?
                .capped_at(self.rules.max_discount),
            None => Money::zero(),
        };

        let tax_rate = self.tax_rate(jurisdiction);
        let taxable = subtotal
            .checked_sub(discount_amount)
            .ok_or(overflow.clone())?;
        let tax_amount = taxable
            .checked_apply_rate(tax_rate)
            .ok_or(overflow.clone())?;
        let shipping_cost = self.shipping_cost(subtotal, express_shipping);
        let total = taxable
            .checked_add(tax_amount)
            .and_then(|t| t.checked_add(shipping_cost))
            .ok_or(overflow)?;

        if total < self.rules.min_total {
            return Err(PricingRejection::DegenerateTotal {
                total,
                min: self.rules.min_total,
            });
        }
        if total > self.rules.max_total {
            return Err(PricingRejection::LimitExceeded {
                total,
                max: self.rules.max_total,
            });
        }

        Ok(PricedTotals {
            subtotal,
            discount_amount,
            tax_rate,
            tax_amount,
            shipping_cost,
            total,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Edge;
    use crate::types::Product;

    fn items(prices: &[i64]) -> Vec<LineItem> {
        prices
            .iter()
            .enumerate()
            .map(|(i, cents)| {
                LineItem::from_product(&Product::new(
                    format!("P{i:03}"),
                    format!("Item {i}"),
                    Money::from_cents(*cents),
                ))
            })
            .collect()
    }

    fn assert_invariant(t: &PricedTotals) {
        assert_eq!(
            t.total,
            t.subtotal - t.discount_amount + t.tax_amount + t.shipping_cost
        );
    }

    #[test]
    fn test_california_free_shipping_unknown_code() {
        let engine = PricingEngine::default();
        let t = engine
            .price(&items(&[5000, 3000]), Some("NOT-A-CODE"), "CA", false)
            .unwrap();

        assert_eq!(t.subtotal.cents(), 8000);
        assert_eq!(t.discount_amount.cents(), 0);
        assert_eq!(t.tax_amount.cents(), 640);
        assert_eq!(t.shipping_cost.cents(), 0);
        assert_eq!(t.total.cents(), 8640);
        assert_invariant(&t);
    }

    #[test]
    fn test_new_york_express_with_code() {
        let engine = PricingEngine::default();
        let t = engine.price(&items(&[5000]), Some("SAVE20"), "NY", true).unwrap();

        assert_eq!(t.discount_amount.cents(), 1000);
        assert_eq!(t.tax_rate.bps(), 600);
        assert_eq!(t.tax_amount.cents(), 240);
        assert_eq!(t.shipping_cost.cents(), 2599);
        assert_eq!(t.total.cents(), 6839);
        assert_invariant(&t);
    }

    #[test]
    fn test_discount_is_capped() {
        // 20% of $900 would be $180; capped at $100.
        let t = PricingEngine::default()
            .price(&items(&[90_000]), Some("SAVE20"), "NY", false)
            .unwrap();
        assert_eq!(t.discount_amount.cents(), 10_000);
        assert_invariant(&t);
    }

    #[test]
    fn test_discount_codes_are_case_sensitive() {
        let t = PricingEngine::default()
            .price(&items(&[5000]), Some("save20"), "NY", false)
            .unwrap();
        assert!(t.discount_amount.is_zero());
    }

    #[test]
    fn test_shipping_threshold_is_strict() {
        let engine = PricingEngine::default();
        assert_eq!(engine.shipping_cost(Money::from_cents(7500), false).cents(), 999);
        assert_eq!(engine.shipping_cost(Money::from_cents(7501), false).cents(), 0);
        assert_eq!(engine.shipping_cost(Money::from_cents(7501), true).cents(), 1599);
    }

    #[test]
    fn test_over_limit_is_rejected() {
        let result = PricingEngine::default().price(&items(&[999_999]), None, "NY", false);
        assert!(matches!(result, Err(PricingRejection::LimitExceeded { .. })));
    }

    #[test]
    fn test_extreme_prices_are_rejected_not_wrapped() {
        let engine = PricingEngine::default();

        let result = engine.price(&items(&[i64::MAX, 1]), None, "NY", false);
        assert!(matches!(result, Err(PricingRejection::AmountOverflow { .. })));

        let result = engine.price(&items(&[i64::MAX - 10]), Some("SAVE20"), "CA", true);
        assert!(matches!(result, Err(PricingRejection::AmountOverflow { .. })));

        let result = engine.price(&items(&[i64::MIN, -1]), None, "NY", false);
        assert!(matches!(result, Err(PricingRejection::AmountOverflow { .. })));
    }

    #[test]
    fn test_degenerate_total_is_rejected() {
        const NO_SHIPPING: &[(i64, Money)] = &[];
        let rules = PricingRules {
            standard_shipping: BracketTable::new(Edge::Above, Money::zero(), NO_SHIPPING),
            ..PricingRules::default()
        };
        let result = PricingEngine::new(rules).price(&[], None, "NY", false);
        assert!(matches!(
            result,
            Err(PricingRejection::DegenerateTotal { total, .. }) if total.is_zero()
        ));
    }

    #[test]
    fn test_invariant_holds_across_inputs() {
        let engine = PricingEngine::default();
        let codes = [None, Some("WELCOME10"), Some("SAVE20"), Some("BULK15")];
        for prices in [&[1][..], &[333, 667], &[7499, 2], &[12_345, 6_789, 1], &[49_999]] {
            for code in codes {
                for state in ["CA", "NY", "TX"] {
                    for express in [false, true] {
                        let t = engine.price(&items(prices), code, state, express).unwrap();
                        assert_invariant(&t);
                        assert!(t.total.is_positive());
                    }
                }
            }
        }
    }
}

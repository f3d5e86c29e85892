//! # Rule Tables
//!
//! Every business threshold used by the pipeline, as data.
//!
//! ## Bracket Tables
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DISCOUNT_BY_AGE (edge: AtOrAbove)                                      │
//! │                                                                         │
//! │   age:   0 ─────────── 25 ─────────────────── 65 ──────────► ∞          │
//! │   rate:  │    15%      │         10%          │     20%                 │
//! │          floor         threshold              threshold                 │
//! │                                                                         │
//! │  lookup(v) = outcome of the highest threshold that v passes,            │
//! │              or the floor outcome if v passes none                      │
//! │                                                                         │
//! │  AtOrAbove: v >= threshold  (inclusive lower / exclusive upper)         │
//! │  Above:     v >  threshold  ("more than $75", "error rate over 10%")    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The discount and category tables use different age cut points. They are
//! kept as two independent tables; do not merge them.

use crate::money::Money;
use crate::types::{AgeCategory, Rate};

// =============================================================================
// Bracket Table
// =============================================================================

/// How a value is compared against a bracket threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// `value >= threshold` selects the bracket.
    AtOrAbove,
    /// `value > threshold` selects the bracket.
    Above,
}

/// An ordered set of `(threshold, outcome)` pairs mapping a continuous value
/// to a discrete outcome.
///
/// Thresholds must be listed in ascending order.
#[derive(Debug, Clone, Copy)]
pub struct BracketTable<K: 'static, V: 'static> {
    edge: Edge,
    floor: V,
    brackets: &'static [(K, V)],
}

impl<K, V> BracketTable<K, V>
where
    K: PartialOrd + Copy,
    V: Copy,
{
    pub const fn new(edge: Edge, floor: V, brackets: &'static [(K, V)]) -> Self {
        BracketTable {
            edge,
            floor,
            brackets,
        }
    }

    /// Maps a value to its bracket outcome.
    ///
    /// ```rust
    /// use batchline_core::rules::CATEGORY_BY_AGE;
    /// use batchline_core::types::AgeCategory;
    ///
    /// assert_eq!(CATEGORY_BY_AGE.lookup(17), AgeCategory::Minor);
    /// assert_eq!(CATEGORY_BY_AGE.lookup(18), AgeCategory::YoungAdult);
    /// assert_eq!(CATEGORY_BY_AGE.lookup(50), AgeCategory::Senior);
    /// ```
    pub fn lookup(&self, value: K) -> V {
        self.brackets
            .iter()
            .rev()
            .find(|(threshold, _)| self.passes(value, *threshold))
            .map(|(_, outcome)| *outcome)
            .unwrap_or(self.floor)
    }

    fn passes(&self, value: K, threshold: K) -> bool {
        match self.edge {
            Edge::AtOrAbove => value >= threshold,
            Edge::Above => value > threshold,
        }
    }

    pub fn edge(&self) -> Edge {
        self.edge
    }

    pub fn floor(&self) -> V {
        self.floor
    }

    pub fn brackets(&self) -> &'static [(K, V)] {
        self.brackets
    }
}

// =============================================================================
// Derivation Tables
// =============================================================================

/// Discount rate by age: under 25 → 15%, 25..65 → 10%, 65 and over → 20%.
pub const DISCOUNT_BY_AGE: BracketTable<u32, Rate> = BracketTable::new(
    Edge::AtOrAbove,
    Rate::from_bps(1500),
    &[(25, Rate::from_bps(1000)), (65, Rate::from_bps(2000))],
);

/// Category by age: under 18 minor, 18..30 young adult, 30..50 adult,
/// 50 and over senior.
pub const CATEGORY_BY_AGE: BracketTable<u32, AgeCategory> = BracketTable::new(
    Edge::AtOrAbove,
    AgeCategory::Minor,
    &[
        (18, AgeCategory::YoungAdult),
        (30, AgeCategory::Adult),
        (50, AgeCategory::Senior),
    ],
);

/// Estimated tax rate by salary (cents): 25% strictly above $100,000,
/// otherwise 15%.
pub const SALARY_TAX: BracketTable<i64, Rate> = BracketTable::new(
    Edge::Above,
    Rate::from_bps(1500),
    &[(10_000_000, Rate::from_bps(2500))],
);

/// Processing fee: 2% of salary, never less than $25.00.
pub const PROCESSING_FEE_RATE: Rate = Rate::from_bps(200);
pub const PROCESSING_FEE_FLOOR: Money = Money::from_cents(2500);

// =============================================================================
// Pricing Tables
// =============================================================================

/// Standard shipping by subtotal (cents): $9.99, free above $75.00.
pub const STANDARD_SHIPPING: BracketTable<i64, Money> = BracketTable::new(
    Edge::Above,
    Money::from_cents(999),
    &[(7500, Money::from_cents(0))],
);

/// Express shipping by subtotal (cents): $25.99, $15.99 above $75.00.
pub const EXPRESS_SHIPPING: BracketTable<i64, Money> = BracketTable::new(
    Edge::Above,
    Money::from_cents(2599),
    &[(7500, Money::from_cents(1599))],
);

/// Sales tax by jurisdiction code; anything not listed pays the default.
pub const JURISDICTION_TAX: &[(&str, Rate)] = &[("CA", Rate::from_bps(800))];
pub const DEFAULT_JURISDICTION_TAX: Rate = Rate::from_bps(600);

/// Percentage discount codes. Lookup is exact and case-sensitive.
pub const DISCOUNT_CODES: &[(&str, Rate)] = &[
    ("WELCOME10", Rate::from_bps(1000)),
    ("SAVE20", Rate::from_bps(2000)),
    ("BULK15", Rate::from_bps(1500)),
];

/// Absolute cap on any code discount.
pub const MAX_DISCOUNT: Money = Money::from_cents(10_000);

/// Orders totalling less than one cent are degenerate.
pub const MIN_ORDER_TOTAL: Money = Money::from_cents(1);

/// Orders totalling more than $10,000.00 exceed the limit.
pub const MAX_ORDER_TOTAL: Money = Money::from_cents(1_000_000);

// =============================================================================
// Reporting Tables
// =============================================================================

/// Throughput class for a batch, by records per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThroughputClass {
    Excellent,
    Good,
    Average,
    Poor,
}

/// Quality grade for a batch, by error rate percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// Above 100/s excellent, above 50/s good, above 20/s average, else poor.
pub const THROUGHPUT_CLASS: BracketTable<f64, ThroughputClass> = BracketTable::new(
    Edge::Above,
    ThroughputClass::Poor,
    &[
        (20.0, ThroughputClass::Average),
        (50.0, ThroughputClass::Good),
        (100.0, ThroughputClass::Excellent),
    ],
);

/// Error rate above 10% poor, above 5% fair, above 1% good, else excellent.
pub const QUALITY_BY_ERROR_RATE: BracketTable<f64, QualityGrade> = BracketTable::new(
    Edge::Above,
    QualityGrade::Excellent,
    &[
        (1.0, QualityGrade::Good),
        (5.0, QualityGrade::Fair),
        (10.0, QualityGrade::Poor),
    ],
);

/// Serialized reports larger than this are flagged as truncated.
pub const REPORT_SIZE_LIMIT_BYTES: usize = 10_240;

// =============================================================================
// Validation Limits
// =============================================================================

pub const EMAIL_MIN_LEN: usize = 5;
pub const EMAIL_MAX_LEN: usize = 254;

pub const AGE_MIN: i64 = 13;
pub const AGE_MAX: i64 = 120;

pub const PHONE_MIN_DIGITS: usize = 10;
pub const PHONE_MAX_DIGITS: usize = 15;

/// Salary bounds in whole dollars.
pub const SALARY_MIN_DOLLARS: i64 = 15_000;
pub const SALARY_MAX_DOLLARS: i64 = 1_000_000;

// =============================================================================
// Unit Tests
// =============================================================================

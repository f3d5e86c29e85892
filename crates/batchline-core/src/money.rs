//! # Money Module
//!
//! Provides the `Money` type used for every amount in the pipeline: line-item
//! prices, order totals, salaries, estimated tax and processing fees.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ORDER TOTAL INVARIANT                                                  │
//! │                                                                         │
//! │    total == subtotal - discount + tax + shipping                        │
//! │                                                                         │
//! │  With floats:  50.00 - 10.00 + 2.40 + 25.99 = 68.38999999999999        │
//! │  With cents:   5000  - 1000  + 240  + 2599  = 6839   (exact)           │
//! │                                                                         │
//! │  Rates are applied once, rounded half-up to the cent, and everything   │
//! │  downstream is plain integer addition.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use batchline_core::money::Money;
//! use batchline_core::types::Rate;
//!
//! let subtotal = Money::from_cents(5000); // $50.00
//! let discount = subtotal.apply_rate(Rate::from_bps(2000)); // 20%
//! assert_eq!(discount.cents(), 1000);
//! assert_eq!((subtotal - discount).to_string(), "$40.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for USD).
///
/// Signed so that intermediate values (a discount exceeding a subtotal, a
/// refund) stay representable; pricing rejects non-positive totals instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use batchline_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(999).cents(), 999);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole dollars.
    #[inline]
    pub const fn from_dollars(dollars: i64) -> Self {
        Money(dollars * 100)
    }

    /// Converts a decimal amount received from an untyped source (a JSON
    /// number such as a salary) into cents, rounding to the nearest cent.
    ///
    /// Returns `None` for NaN, infinities and values outside the `i64` cent
    /// range. This is the only place a float enters the money domain.
    ///
    /// ```rust
    /// use batchline_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(52000.0).map(|m| m.cents()), Some(5_200_000));
    /// assert_eq!(Money::from_decimal(19.999).map(|m| m.cents()), Some(2000));
    /// assert_eq!(Money::from_decimal(f64::NAN), None);
    /// ```
    pub fn from_decimal(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        let cents = (amount * 100.0).round();
        if cents < i64::MIN as f64 || cents > i64::MAX as f64 {
            return None;
        }
        Some(Money(cents as i64))
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-dollar portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a rate and rounds half-up to the cent.
    ///
    /// ## Implementation
    /// Integer math in `i128`: `(cents * bps + 5000) / 10000`. The +5000 is
    /// half of one basis-point denominator, which rounds to nearest.
    ///
    /// ```rust
    /// use batchline_core::money::Money;
    /// use batchline_core::types::Rate;
    ///
    /// // $40.00 at 6% = $2.40
    /// let tax = Money::from_cents(4000).apply_rate(Rate::from_bps(600));
    /// assert_eq!(tax.cents(), 240);
    ///
    /// // $10.00 at 8.25% = $0.825 -> $0.83
    /// let tax = Money::from_cents(1000).apply_rate(Rate::from_bps(825));
    /// assert_eq!(tax.cents(), 83);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        let saturated = if cents.is_negative() { i64::MIN } else { i64::MAX };
        Money::from_cents(i64::try_from(cents).unwrap_or(saturated))
    }

    /// Like [`Money::apply_rate`], but `None` when the result leaves the
    /// `i64` cent range.
    pub fn checked_apply_rate(&self, rate: Rate) -> Option<Money> {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        i64::try_from(cents).ok().map(Money)
    }

    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    #[inline]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Returns the smaller of `self` and `cap`.
    #[inline]
    pub fn capped_at(self, cap: Money) -> Money {
        self.min(cap)
    }

    /// Returns the larger of `self` and `floor`.
    #[inline]
    pub fn at_least(self, floor: Money) -> Money {
        self.max(floor)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Human-readable form, e.g. `$68.39` or `-$5.50`. Reports serialize cents.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(6839).to_string(), "$68.39");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_from_decimal_rounds_to_cent() {
        assert_eq!(Money::from_decimal(29.99).unwrap().cents(), 2999);
        assert_eq!(Money::from_decimal(0.01).unwrap().cents(), 1);
        assert_eq!(Money::from_decimal(-12.5).unwrap().cents(), -1250);
        assert!(Money::from_decimal(f64::INFINITY).is_none());
        assert!(Money::from_decimal(1e30).is_none());
    }

    #[test]
    fn test_apply_rate_rounds_half_up() {
        // $80.00 at 8% = $6.40
        assert_eq!(Money::from_cents(8000).apply_rate(Rate::from_bps(800)).cents(), 640);
        // $0.05 at 10% = $0.005 -> $0.01
        assert_eq!(Money::from_cents(5).apply_rate(Rate::from_bps(1000)).cents(), 1);
        assert_eq!(Money::from_cents(1234).apply_rate(Rate::zero()).cents(), 0);
    }

    #[test]
    fn test_checked_operations() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(10).checked_add(Money::from_cents(5)),
            Some(Money::from_cents(15))
        );

        // 250% of the largest amount does not fit
        assert_eq!(max.checked_apply_rate(Rate::from_bps(25_000)), None);
        assert_eq!(max.apply_rate(Rate::from_bps(25_000)), max);
        assert_eq!(
            Money::from_cents(8000).checked_apply_rate(Rate::from_bps(800)),
            Some(Money::from_cents(640))
        );
    }

    #[test]
    fn test_cap_and_floor() {
        let cap = Money::from_dollars(100);
        assert_eq!(Money::from_cents(15000).capped_at(cap), cap);
        assert_eq!(Money::from_cents(900).capped_at(cap).cents(), 900);

        let floor = Money::from_dollars(25);
        assert_eq!(Money::from_cents(300).at_least(floor), floor);
        assert_eq!(Money::from_cents(104_000).at_least(floor).cents(), 104_000);
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);
        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);
        assert_eq!((b * 3).cents(), 750);

        let items = [Money::from_cents(2999), Money::from_cents(1999), Money::from_cents(1)];
        let total: Money = items.iter().sum();
        assert_eq!(total.cents(), 4999);
        assert!(Money::zero().is_zero());
        assert!(a.is_positive());
        assert!((b - a).is_negative());
    }
}

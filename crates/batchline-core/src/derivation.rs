//! # Derivation Engine
//!
//! Computes the dependent attributes of a validated record from the rule
//! tables. Pure and total over age and salary.
//!
//! ```text
//!   age ────► DISCOUNT_BY_AGE ────► discount_rate
//!   age ────► CATEGORY_BY_AGE ────► category
//!   salary ─► SALARY_TAX ─────────► estimated_tax   (salary present only)
//!   salary ─► 2%, floor $25 ──────► processing_fee  (salary present only)
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;
use crate::rules::{
    CATEGORY_BY_AGE, DISCOUNT_BY_AGE, PROCESSING_FEE_FLOOR, PROCESSING_FEE_RATE, SALARY_TAX,
};
use crate::types::{AgeCategory, OnboardedUser, Rate};
use crate::validation::NormalizedFields;

/// Attributes computed from age and salary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derived {
    pub discount_rate: Rate,
    pub category: AgeCategory,
    pub estimated_tax: Option<Money>,
    pub processing_fee: Option<Money>,
}

/// Derives discount, category, estimated tax and processing fee.
///
/// ```rust
/// use batchline_core::derivation::derive;
/// use batchline_core::money::Money;
/// use batchline_core::types::AgeCategory;
///
/// let d = derive(28, Some(Money::from_dollars(52_000)));
/// assert_eq!(d.discount_rate.bps(), 1000);
/// assert_eq!(d.category, AgeCategory::YoungAdult);
/// assert_eq!(d.estimated_tax, Some(Money::from_dollars(7_800)));
/// assert_eq!(d.processing_fee, Some(Money::from_dollars(1_040)));
/// ```
pub fn derive(age: u32, salary: Option<Money>) -> Derived {
    Derived {
        discount_rate: DISCOUNT_BY_AGE.lookup(age),
        category: CATEGORY_BY_AGE.lookup(age),
        estimated_tax: salary.map(|s| s.apply_rate(SALARY_TAX.lookup(s.cents()))),
        processing_fee: salary.map(|s| s.apply_rate(PROCESSING_FEE_RATE).at_least(PROCESSING_FEE_FLOOR)),
    }
}

/// Builds an onboarded user from validated fields.
///
/// Returns `None` when the fields lack the email or age that registration
/// requires; callers only reach this after a clean validation.
pub fn onboard(fields: &NormalizedFields, record_index: usize) -> Option<OnboardedUser> {
    let email = fields.email.clone()?;
    let age = fields.age?;
    let derived = derive(age, fields.salary);

    Some(OnboardedUser {
        id: Uuid::new_v4().to_string(),
        record_index,
        email,
        full_name: fields.full_name.clone().unwrap_or_default(),
        age,
        phone: fields.phone.clone(),
        phone_formatted: fields.phone_formatted.clone(),
        salary: fields.salary,
        discount_rate: derived.discount_rate,
        category: derived.category,
        estimated_tax: derived.estimated_tax,
        processing_fee: derived.processing_fee,
        created_at: Utc::now(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_salary_means_no_tax_or_fee() {
        let d = derive(70, None);
        assert_eq!(d.discount_rate.bps(), 2000);
        assert_eq!(d.category, AgeCategory::Senior);
        assert!(d.estimated_tax.is_none());
        assert!(d.processing_fee.is_none());
    }

    #[test]
    fn test_high_salary_bracket() {
        let d = derive(40, Some(Money::from_dollars(100_000)));
        assert_eq!(d.estimated_tax, Some(Money::from_dollars(15_000)));

        let d = derive(40, Some(Money::from_dollars(120_000)));
        assert_eq!(d.estimated_tax, Some(Money::from_dollars(30_000)));
        assert_eq!(d.processing_fee, Some(Money::from_dollars(2_400)));
    }

    #[test]
    fn test_processing_fee_floor() {
        // 2% of $1,000 is $20, below the $25 floor.
        let d = derive(30, Some(Money::from_dollars(1_000)));
        assert_eq!(d.processing_fee, Some(Money::from_dollars(25)));
    }

    #[test]
    fn test_onboard_requires_email_and_age() {
        let mut fields = NormalizedFields {
            email: Some("a@b.co".to_string()),
            age: Some(19),
            ..Default::default()
        };
        let user = onboard(&fields, 4).unwrap();
        assert_eq!(user.record_index, 4);
        assert_eq!(user.category, AgeCategory::YoungAdult);
        assert_eq!(user.discount_rate.bps(), 1500);

        fields.age = None;
        assert!(onboard(&fields, 4).is_none());
    }
}

//! # Validation Engine
//!
//! Field-level checks for raw input records. Every entry point (registration,
//! login, profile update, checkout) goes through [`validate`]; the profile
//! only selects which fields are required.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  RawRecord ──► email ──► age ──► phone ──► salary ──► names ──► ...     │
//! │                  │        │        │         │                          │
//! │                  ▼        ▼        ▼         ▼                          │
//! │             ┌──────────────────────────────────────┐                    │
//! │             │  violations: Vec<ValidationError>    │  (no short-circuit)│
//! │             │  fields:     NormalizedFields        │                    │
//! │             └──────────────────────────────────────┘                    │
//! │                                                                         │
//! │  Never panics, never mutates shared state. Wrong JSON types become     │
//! │  violations, not faults.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use batchline_core::types::RawRecord;
//! use batchline_core::validation::{validate, ValidationOptions, ValidationProfile};
//!
//! let record = RawRecord::default()
//!     .with("email", "  Ada@Example.COM ")
//!     .with("age", 36);
//!
//! let result = validate(&record, ValidationProfile::Registration, ValidationOptions::default());
//! assert!(result.is_valid());
//! assert_eq!(result.fields.email.as_deref(), Some("ada@example.com"));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::money::Money;
use crate::rules::{
    AGE_MAX, AGE_MIN, EMAIL_MAX_LEN, EMAIL_MIN_LEN, PHONE_MAX_DIGITS, PHONE_MIN_DIGITS,
    SALARY_MAX_DOLLARS, SALARY_MIN_DOLLARS,
};
use crate::types::RawRecord;

/// Single "@", non-empty local part, at least one "." after the "@".
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Valid regex pattern"));

// =============================================================================
// Profiles & Options
// =============================================================================

/// Which entry point is validating, and therefore which fields are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationProfile {
    /// New user: email and age required, phone and salary optional.
    Registration,
    /// Email required; age checked only when present.
    Login,
    /// Partial update: every field checked only when present.
    Update,
    /// Registration rules plus `state` and a non-empty `product_ids` list.
    Checkout,
}

impl ValidationProfile {
    fn requires_email(&self) -> bool {
        !matches!(self, ValidationProfile::Update)
    }

    fn requires_age(&self) -> bool {
        matches!(
            self,
            ValidationProfile::Registration | ValidationProfile::Checkout
        )
    }

    fn is_checkout(&self) -> bool {
        matches!(self, ValidationProfile::Checkout)
    }
}

/// Options mirroring the batch configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// When false, email presence is still required but length and shape
    /// are not checked.
    pub check_email_format: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            check_email_format: true,
        }
    }
}

// =============================================================================
// Result
// =============================================================================

/// Fields extracted and normalized from a raw record.
///
/// A field is `None` when it was absent or failed its check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFields {
    /// Trimmed, lower-cased.
    pub email: Option<String>,
    pub age: Option<u32>,
    /// Digits only.
    pub phone: Option<String>,
    pub phone_formatted: Option<String>,
    pub salary: Option<Money>,
    pub full_name: Option<String>,
    /// Upper-cased `state`.
    pub jurisdiction: Option<String>,
    pub product_ids: Vec<String>,
    pub discount_code: Option<String>,
    pub express_shipping: bool,
    pub shipping_address: Option<String>,
}

/// Ordered violations (empty means valid) plus the normalized fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    pub violations: Vec<ValidationError>,
    pub fields: NormalizedFields,
}

impl ValidationResult {
    /// A result holding one violation and no fields.
    pub fn rejected(violation: ValidationError) -> Self {
        ValidationResult {
            violations: vec![violation],
            fields: NormalizedFields::default(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violation messages in check order.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Validates an arbitrary JSON value. Anything but an object yields the
/// single violation "record must be an object".
pub fn validate_value(
    value: &Value,
    profile: ValidationProfile,
    options: ValidationOptions,
) -> ValidationResult {
    match value {
        Value::Object(fields) => validate(&RawRecord::new(fields.clone()), profile, options),
        _ => ValidationResult::rejected(ValidationError::NotAnObject),
    }
}

/// Validates a record, collecting every violation before returning.
///
/// Pure: validating the same record twice yields the same result.
pub fn validate(
    record: &RawRecord,
    profile: ValidationProfile,
    options: ValidationOptions,
) -> ValidationResult {
    let mut check = Checker::default();

    check.fields.email = check.email(record, profile.requires_email(), options);
    check.fields.age = check.age(record, profile.requires_age());

    if let Some(digits) = check.phone(record) {
        check.fields.phone_formatted = Some(format_phone(&digits));
        check.fields.phone = Some(digits);
    }
    check.fields.salary = check.salary(record);
    check.fields.full_name = check.full_name(record);

    check.fields.jurisdiction = check
        .string(record, "state", profile.is_checkout())
        .map(|s| s.to_uppercase());
    if profile.is_checkout() || record.get("product_ids").is_some() {
        check.fields.product_ids = check.product_ids(record, profile.is_checkout());
    }
    check.fields.discount_code = check.string(record, "discount_code", false);
    check.fields.express_shipping = check.flag(record, "express_shipping");
    check.fields.shipping_address = check.string(record, "shipping_address", false);

    ValidationResult {
        violations: check.violations,
        fields: check.fields,
    }
}

// =============================================================================
// Field Checks
// =============================================================================

#[derive(Default)]
struct Checker {
    violations: Vec<ValidationError>,
    fields: NormalizedFields,
}

impl Checker {
    fn push(&mut self, violation: ValidationError) {
        self.violations.push(violation);
    }

    /// Optional string field: trimmed, `None` when absent or blank.
    fn string(&mut self, record: &RawRecord, field: &str, required: bool) -> Option<String> {
        let trimmed = match record.get(field) {
            None => None,
            Some(Value::String(s)) => Some(s.trim()).filter(|s| !s.is_empty()),
            Some(_) => {
                self.push(ValidationError::wrong_type(field, "string"));
                return None;
            }
        };
        if trimmed.is_none() && required {
            self.push(ValidationError::required(field));
        }
        trimmed.map(str::to_string)
    }

    fn email(
        &mut self,
        record: &RawRecord,
        required: bool,
        options: ValidationOptions,
    ) -> Option<String> {
        let email = self.string(record, "email", required)?.to_lowercase();
        if !options.check_email_format {
            return Some(email);
        }

        let len = email.chars().count();
        if len < EMAIL_MIN_LEN {
            self.push(ValidationError::TooShort {
                field: "email".to_string(),
                min: EMAIL_MIN_LEN,
            });
            return None;
        }
        if len > EMAIL_MAX_LEN {
            self.push(ValidationError::TooLong {
                field: "email".to_string(),
                max: EMAIL_MAX_LEN,
            });
            return None;
        }
        if !EMAIL_PATTERN.is_match(&email) {
            self.push(ValidationError::InvalidFormat {
                field: "email".to_string(),
                reason: "expected local@domain.tld".to_string(),
            });
            return None;
        }
        Some(email)
    }

    fn age(&mut self, record: &RawRecord, required: bool) -> Option<u32> {
        let Some(value) = record.get("age") else {
            if required {
                self.push(ValidationError::required("age"));
            }
            return None;
        };
        let Some(age) = as_whole_number(value) else {
            self.push(ValidationError::wrong_type("age", "integer"));
            return None;
        };
        if !(AGE_MIN..=AGE_MAX).contains(&age) {
            self.push(ValidationError::OutOfRange {
                field: "age".to_string(),
                min: AGE_MIN,
                max: AGE_MAX,
            });
            return None;
        }
        u32::try_from(age).ok()
    }

    /// Returns the digits of a valid phone number. A present phone is
    /// always digit-checked, blank or not.
    fn phone(&mut self, record: &RawRecord) -> Option<String> {
        let raw = match record.get("phone")? {
            Value::String(s) => s,
            _ => {
                self.push(ValidationError::wrong_type("phone", "string"));
                return None;
            }
        };
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits.len()) {
            self.push(ValidationError::DigitCount {
                field: "phone".to_string(),
                min: PHONE_MIN_DIGITS,
                max: PHONE_MAX_DIGITS,
            });
            return None;
        }
        Some(digits)
    }

    fn salary(&mut self, record: &RawRecord) -> Option<Money> {
        let value = record.get("salary")?;
        let Some(dollars) = value.as_f64() else {
            self.push(ValidationError::wrong_type("salary", "number"));
            return None;
        };
        let in_range = dollars >= SALARY_MIN_DOLLARS as f64 && dollars <= SALARY_MAX_DOLLARS as f64;
        match Money::from_decimal(dollars) {
            Some(salary) if in_range => Some(salary),
            _ => {
                self.push(ValidationError::OutOfRange {
                    field: "salary".to_string(),
                    min: SALARY_MIN_DOLLARS,
                    max: SALARY_MAX_DOLLARS,
                });
                None
            }
        }
    }

    fn full_name(&mut self, record: &RawRecord) -> Option<String> {
        let first = self.string(record, "first_name", false);
        let last = self.string(record, "last_name", false);
        let parts: Vec<String> = first.into_iter().chain(last).collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    fn product_ids(&mut self, record: &RawRecord, required: bool) -> Vec<String> {
        let items = match record.get("product_ids") {
            None => {
                if required {
                    self.push(ValidationError::required("product_ids"));
                }
                return Vec::new();
            }
            Some(Value::Array(items)) => items,
            Some(_) => {
                self.push(ValidationError::wrong_type("product_ids", "array of strings"));
                return Vec::new();
            }
        };

        let ids: Option<Vec<String>> = items
            .iter()
            .map(|item| item.as_str().map(|s| s.trim().to_string()))
            .collect();
        match ids {
            None => {
                self.push(ValidationError::wrong_type("product_ids", "array of strings"));
                Vec::new()
            }
            Some(ids) if ids.is_empty() && required => {
                self.push(ValidationError::required("product_ids"));
                ids
            }
            Some(ids) => ids,
        }
    }

    fn flag(&mut self, record: &RawRecord, field: &str) -> bool {
        match record.get(field) {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                self.push(ValidationError::wrong_type(field, "boolean"));
                false
            }
        }
    }
}

/// Integers, and floats with no fractional part (`36.0`), are whole numbers.
fn as_whole_number(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    if value.is_u64() {
        return Some(i64::MAX);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}

// =============================================================================
// Phone Formatting
// =============================================================================

/// Display format for a digits-only phone number.
///
/// ```rust
/// use batchline_core::validation::format_phone;
///
/// assert_eq!(format_phone("5551234567"), "(555) 123-4567");
/// assert_eq!(format_phone("15551234567"), "+1 (555) 123-4567");
/// assert_eq!(format_phone("445551234567"), "445551234567");
/// ```
pub fn format_phone(digits: &str) -> String {
    match digits.len() {
        10 => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
        11 if digits.starts_with('1') => {
            format!("+1 ({}) {}-{}", &digits[1..4], &digits[4..7], &digits[7..])
        }
        _ => digits.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    fn registration(value: Value) -> ValidationResult {
        validate(
            &record(value),
            ValidationProfile::Registration,
            ValidationOptions::default(),
        )
    }

    #[test]
    fn test_valid_registration_normalizes_fields() {
        let result = registration(json!({
            "email": "  Grace.Hopper@Navy.MIL ",
            "first_name": "Grace",
            "last_name": "Hopper",
            "age": 45,
            "phone": "555-123-4567",
            "salary": 52000.0
        }));

        assert!(result.is_valid(), "{:?}", result.violations);
        let f = &result.fields;
        assert_eq!(f.email.as_deref(), Some("grace.hopper@navy.mil"));
        assert_eq!(f.full_name.as_deref(), Some("Grace Hopper"));
        assert_eq!(f.age, Some(45));
        assert_eq!(f.phone.as_deref(), Some("5551234567"));
        assert_eq!(f.phone_formatted.as_deref(), Some("(555) 123-4567"));
        assert_eq!(f.salary.map(|s| s.cents()), Some(5_200_000));
    }

    #[test]
    fn test_collects_all_violations() {
        let result = registration(json!({
            "email": "not-an-email",
            "age": 7,
            "phone": "123",
            "salary": 500
        }));

        let fields: Vec<_> = result.violations.iter().filter_map(|v| v.field()).collect();
        assert_eq!(fields, vec!["email", "age", "phone", "salary"]);
    }

    #[test]
    fn test_missing_required_fields() {
        let result = registration(json!({}));
        assert_eq!(result.messages(), vec!["email is required", "age is required"]);
    }

    #[test]
    fn test_email_rules() {
        let short = registration(json!({"email": "a@b", "age": 30}));
        assert!(matches!(
            result_first(&short),
            ValidationError::TooShort { min: 5, .. }
        ));

        let long = format!("{}@example.com", "a".repeat(250));
        let long = registration(json!({"email": long, "age": 30}));
        assert!(matches!(
            result_first(&long),
            ValidationError::TooLong { max: 254, .. }
        ));

        for bad in ["a@@b.co", "ab@cdef", "@b.com", "a b@c.de"] {
            let result = registration(json!({"email": bad, "age": 30}));
            assert!(!result.is_valid(), "{bad} should be rejected");
        }

        let blank = registration(json!({"email": "   ", "age": 30}));
        assert_eq!(blank.messages(), vec!["email is required"]);
    }

    #[test]
    fn test_email_format_check_can_be_disabled() {
        let options = ValidationOptions {
            check_email_format: false,
        };
        let result = validate(
            &record(json!({"email": "whatever", "age": 30})),
            ValidationProfile::Registration,
            options,
        );
        assert!(result.is_valid());

        let missing = validate(&record(json!({"age": 30})), ValidationProfile::Registration, options);
        assert_eq!(missing.messages(), vec!["email is required"]);
    }

    #[test]
    fn test_age_boundaries() {
        for (age, ok) in [(12, false), (13, true), (120, true), (121, false), (-1, false)] {
            let result = registration(json!({"email": "a@b.co", "age": age}));
            assert_eq!(result.is_valid(), ok, "age {age}");
        }
        assert!(registration(json!({"email": "a@b.co", "age": 40.0})).is_valid());
    }

    #[test]
    fn test_wrong_types_are_violations() {
        let result = registration(json!({
            "email": 42,
            "age": "thirty",
            "salary": "lots",
            "express_shipping": "yes"
        }));
        assert_eq!(
            result.messages(),
            vec![
                "email has wrong type: expected string",
                "age has wrong type: expected integer",
                "salary has wrong type: expected number",
                "express_shipping has wrong type: expected boolean",
            ]
        );
    }

    #[test]
    fn test_blank_phone_is_checked() {
        for phone in ["", "   ", "--"] {
            let result = registration(json!({"email": "a@b.co", "age": 30, "phone": phone}));
            assert_eq!(
                result.messages(),
                vec!["phone must have between 10 and 15 digits"],
                "phone {phone:?}"
            );
            assert!(result.fields.phone.is_none());
        }

        let null = registration(json!({"email": "a@b.co", "age": 30, "phone": null}));
        assert!(null.is_valid());
    }

    #[test]
    fn test_salary_bounds_are_inclusive() {
        for (salary, ok) in [(14_999.99, false), (15_000.0, true), (1_000_000.0, true), (1_000_000.01, false)] {
            let result = registration(json!({"email": "a@b.co", "age": 30, "salary": salary}));
            assert_eq!(result.is_valid(), ok, "salary {salary}");
        }
    }

    #[test]
    fn test_profiles() {
        let login = validate(
            &record(json!({"email": "a@b.co"})),
            ValidationProfile::Login,
            ValidationOptions::default(),
        );
        assert!(login.is_valid());

        let update = validate(
            &record(json!({"phone": "1 (555) 123-4567"})),
            ValidationProfile::Update,
            ValidationOptions::default(),
        );
        assert!(update.is_valid());
        assert_eq!(
            update.fields.phone_formatted.as_deref(),
            Some("+1 (555) 123-4567")
        );

        let checkout = validate(
            &record(json!({"email": "a@b.co", "age": 30, "product_ids": []})),
            ValidationProfile::Checkout,
            ValidationOptions::default(),
        );
        assert_eq!(
            checkout.messages(),
            vec!["state is required", "product_ids is required"]
        );
    }

    #[test]
    fn test_checkout_fields() {
        let result = validate(
            &record(json!({
                "email": "buyer@shop.io",
                "age": 30,
                "state": "ca",
                "product_ids": ["P001", " P002 "],
                "discount_code": "SAVE20",
                "express_shipping": true,
                "shipping_address": "1 Main St"
            })),
            ValidationProfile::Checkout,
            ValidationOptions::default(),
        );
        assert!(result.is_valid(), "{:?}", result.violations);
        let f = &result.fields;
        assert_eq!(f.jurisdiction.as_deref(), Some("CA"));
        assert_eq!(f.product_ids, vec!["P001", "P002"]);
        assert_eq!(f.discount_code.as_deref(), Some("SAVE20"));
        assert!(f.express_shipping);
        assert_eq!(f.shipping_address.as_deref(), Some("1 Main St"));

        let mixed = validate(
            &record(json!({"email": "a@b.co", "age": 30, "state": "NY", "product_ids": ["P1", 2]})),
            ValidationProfile::Checkout,
            ValidationOptions::default(),
        );
        assert_eq!(
            mixed.messages(),
            vec!["product_ids has wrong type: expected array of strings"]
        );
    }

    #[test]
    fn test_non_object_record() {
        let result = validate_value(
            &json!(["a@b.co", 30]),
            ValidationProfile::Registration,
            ValidationOptions::default(),
        );
        assert_eq!(result.messages(), vec!["record must be an object"]);
    }

    #[test]
    fn test_revalidation_is_idempotent() {
        let input = record(json!({"email": "a@b.co", "age": 30, "phone": "5551234567"}));
        let first = validate(&input, ValidationProfile::Registration, ValidationOptions::default());
        let second = validate(&input, ValidationProfile::Registration, ValidationOptions::default());
        assert!(first.is_valid());
        assert_eq!(first, second);
    }

    fn result_first(result: &ValidationResult) -> &ValidationError {
        &result.violations[0]
    }
}

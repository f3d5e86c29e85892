//! # Error Types
//!
//! Domain-specific error types for batchline-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  batchline-core errors (this file)                                     │
//! │  ├── CoreError         - Business rule failures for one record         │
//! │  ├── ValidationError   - One field-level violation                     │
//! │  └── PricingRejection  - Degenerate or over-limit order totals         │
//! │                                                                         │
//! │  batchline-engine errors (separate crate)                              │
//! │  ├── Rejection         - Why a record failed (typed outcome)           │
//! │  └── EngineError       - Batch-level failures (config, limits)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → Rejection → BatchResult           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, product id, limit)
//! 3. Errors are enum variants, never String
//! 4. Expected business conditions are values, never panics

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule failures for a single record.
///
/// None of these abort a batch; the orchestrator converts them into a
/// per-record rejection and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Customer is too young to check out.
    ///
    /// This is an eligibility rule, separate from the data-validity age
    /// range (13..=120) checked by the validation engine.
    #[error("Customer must be at least {min} years old to check out (age {age})")]
    Ineligible { age: u32, min: u32 },

    /// Order names more products than allowed.
    #[error("Order cannot have more than {max} products (requested {requested})")]
    TooManyProducts { requested: usize, max: usize },

    /// Order names no products at all, or none that the catalog knows.
    #[error("Order has no purchasable products")]
    EmptyOrder,

    /// Pricing refused to produce an order.
    #[error(transparent)]
    Pricing(#[from] PricingRejection),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// One variant instance per violated rule. The validation engine collects
/// every violation for a record before returning, so a record usually maps
/// to a `Vec<ValidationError>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Digit count of a phone-like field is out of range.
    #[error("{field} must have between {min} and {max} digits")]
    DigitCount { field: String, min: usize, max: usize },

    /// Invalid format (e.g. email shape).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Field is present but holds the wrong JSON type.
    #[error("{field} has wrong type: expected {expected}")]
    WrongType { field: String, expected: String },

    /// The record itself is not a key/value object.
    #[error("record must be an object")]
    NotAnObject,

    /// The batch contained no records at all.
    #[error("record list cannot be empty")]
    EmptyBatch,
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub fn wrong_type(field: &str, expected: &str) -> Self {
        ValidationError::WrongType {
            field: field.to_string(),
            expected: expected.to_string(),
        }
    }

    /// The field this violation refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::DigitCount { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::WrongType { field, .. } => Some(field),
            ValidationError::NotAnObject | ValidationError::EmptyBatch => None,
        }
    }
}

// =============================================================================
// Pricing Rejection
// =============================================================================

/// Why the pricing engine refused to produce an order.
///
/// Any reservations made for the order must be released by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingRejection {
    /// Total is below one cent.
    #[error("Order total {total} is below the minimum of {min}")]
    DegenerateTotal { total: Money, min: Money },

    /// Total is above the per-order ceiling.
    #[error("Order total {total} exceeds the limit of {max}")]
    LimitExceeded { total: Money, max: Money },

    /// An intermediate amount does not fit in the money range.
    #[error("Order amounts exceed the limit of {max}")]
    AmountOverflow { max: Money },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

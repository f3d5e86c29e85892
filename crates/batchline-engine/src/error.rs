//! # Engine Error Types
//!
//! Error types for batch orchestration.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Engine Error Categories                            │
//! │                                                                         │
//! │  PER RECORD (batch continues)        PER BATCH (nothing processed)     │
//! │  ────────────────────────────        ─────────────────────────────     │
//! │  Rejection::Invalid                  EngineError::InvalidConfig        │
//! │  Rejection::Ineligible               EngineError::ConfigLoadFailed     │
//! │  Rejection::OutOfStock               EngineError::LimitExceeded        │
//! │  Rejection::LimitExceeded                                              │
//! │  Rejection::Fault                    SIDE EFFECTS (success stands)     │
//! │                                      ─────────────────────────────     │
//! │                                      CollaboratorError                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use batchline_core::{CoreError, ValidationError};

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Engine Error
// =============================================================================

/// Batch-level failures. Any of these means no record was processed.
#[derive(Debug, Error)]
pub enum EngineError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid engine configuration.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Limit Errors
    // =========================================================================
    /// Batch is larger than the configured ceiling.
    #[error("Batch of {records} records exceeds the limit of {max}")]
    LimitExceeded { records: usize, max: usize },

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// The runner could not read or parse its input document.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Report serialization failed.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::SerializationFailed(err.to_string())
    }
}

impl EngineError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidConfig(_) | EngineError::ConfigLoadFailed(_)
        )
    }
}

// =============================================================================
// Rejection
// =============================================================================

/// Why a single record did not produce an entity.
///
/// Rejections are counted and recorded; they never abort the batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    /// The record failed validation. Holds every violation found.
    #[error("{}", join_messages(.0))]
    Invalid(Vec<ValidationError>),

    /// Valid record, but the customer may not check out.
    #[error("{0}")]
    Ineligible(String),

    /// A requested product has no stock left (or is not stocked at all).
    #[error("Product {product_id} is out of stock")]
    OutOfStock { product_id: String },

    /// Too many products, or the priced total is outside the allowed range.
    #[error("{0}")]
    LimitExceeded(String),

    /// The per-record task failed unexpectedly.
    #[error("unexpected fault while processing record")]
    Fault,
}

fn join_messages(violations: &[ValidationError]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Rejection {
    /// Messages to append to the batch violation list.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Rejection::Invalid(violations) => violations.iter().map(|v| v.to_string()).collect(),
            other => vec![other.to_string()],
        }
    }

    /// Returns true if this rejection came from field validation.
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, Rejection::Invalid(_) | Rejection::Fault)
    }

    /// Returns true if the rejection is a resource or limit condition that
    /// might succeed on a later run (restock, smaller order).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Rejection::OutOfStock { .. } | Rejection::LimitExceeded(_)
        )
    }
}

impl From<CoreError> for Rejection {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => Rejection::Invalid(vec![v]),
            CoreError::Ineligible { .. } => Rejection::Ineligible(err.to_string()),
            CoreError::TooManyProducts { .. } | CoreError::Pricing(_) => {
                Rejection::LimitExceeded(err.to_string())
            }
            CoreError::EmptyOrder => Rejection::Invalid(vec![ValidationError::required("product_ids")]),
        }
    }
}

// =============================================================================
// Collaborator Error
// =============================================================================

/// A side-effecting collaborator (persistence, notification, report sink)
/// failed. Recorded, never turns a success into a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{collaborator} failed: {message}")]
pub struct CollaboratorError {
    pub collaborator: &'static str,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(collaborator: &'static str, message: impl Into<String>) -> Self {
        CollaboratorError {
            collaborator,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchline_core::PricingRejection;
    use batchline_core::Money;

    #[test]
    fn test_config_errors() {
        assert!(EngineError::InvalidConfig("max_concurrency must be greater than 0".into())
            .is_config_error());
        assert!(!EngineError::LimitExceeded {
            records: 10,
            max: 5
        }
        .is_config_error());
    }

    #[test]
    fn test_rejection_messages() {
        let rejection = Rejection::Invalid(vec![
            ValidationError::required("email"),
            ValidationError::required("age"),
        ]);
        assert_eq!(rejection.messages(), vec!["email is required", "age is required"]);
        assert_eq!(rejection.to_string(), "email is required; age is required");

        let rejection = Rejection::OutOfStock {
            product_id: "P001".into(),
        };
        assert_eq!(rejection.messages(), vec!["Product P001 is out of stock"]);
        assert!(rejection.is_recoverable());
        assert!(!Rejection::Fault.is_recoverable());
    }

    #[test]
    fn test_core_error_mapping() {
        let rejection: Rejection = CoreError::Ineligible { age: 16, min: 18 }.into();
        assert!(matches!(rejection, Rejection::Ineligible(_)));

        let rejection: Rejection = CoreError::Pricing(PricingRejection::LimitExceeded {
            total: Money::from_cents(2_000_000),
            max: Money::from_cents(1_000_000),
        })
        .into();
        assert!(matches!(rejection, Rejection::LimitExceeded(_)));
    }

    #[test]
    fn test_serialization_errors_are_wrapped() {
        let err: EngineError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, EngineError::SerializationFailed(_)));
        assert!(!err.is_config_error());
    }
}

//! # batchline-core: Pure Business Logic for Batchline
//!
//! This crate holds every business rule of the batch pipeline as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Batchline Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    batchline (runner binary)                    │   │
//! │  │         JSON input ──► EngineConfig ──► report on stdout        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    batchline-engine                             │   │
//! │  │    Orchestrator, InventoryLedger, Report, collaborators         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ batchline-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌───────┐ │   │
//! │  │  │  rules   │ │validation│ │derivation│ │ pricing  │ │ money │ │   │
//! │  │  │ brackets │ │ profiles │ │ discount │ │ discount │ │ Money │ │   │
//! │  │  │  limits  │ │ normalize│ │ tax, fee │ │ tax, ship│ │ Rate  │ │   │
//! │  │  └──────────┘ └──────────┘ └──────────┘ └──────────┘ └───────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO ASYNC • NO SHARED STATE • PURE FUNCTIONS          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (RawRecord, Product, Order, DerivedEntity, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`rules`] - Bracket tables and named limits
//! - [`validation`] - The validation engine and its profiles
//! - [`derivation`] - Discount, category, estimated tax and fee
//! - [`checkout`] - Eligibility, order size and catalog resolution
//! - [`pricing`] - Order totals
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Rules as Data**: Thresholds live in [`rules`], never inline in control flow
//!
//! ## Example Usage
//!
//! ```rust
//! use batchline_core::derivation::derive;
//! use batchline_core::types::AgeCategory;
//!
//! let derived = derive(65, None);
//! assert_eq!(derived.discount_rate.bps(), 2000);
//! assert_eq!(derived.category, AgeCategory::Senior);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod derivation;
pub mod error;
pub mod money;
pub mod pricing;
pub mod rules;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use batchline_core::Money` instead of
// `use batchline_core::money::Money`

pub use error::{CoreError, CoreResult, PricingRejection, ValidationError};
pub use money::Money;
pub use pricing::{PricedTotals, PricingEngine, PricingRules};
pub use types::*;
pub use validation::{ValidationOptions, ValidationProfile, ValidationResult};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum product ids in a single order.
pub const MAX_ORDER_PRODUCTS: usize = 50;

/// Minimum customer age for checkout.
///
/// ## Business Reason
/// An eligibility rule, not a data-validity rule: records for 13-17 year
/// olds are valid users but cannot place orders.
pub const MIN_CHECKOUT_AGE: u32 = 18;

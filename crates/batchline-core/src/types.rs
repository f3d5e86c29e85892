//! # Domain Types
//!
//! Core domain types flowing through the batch pipeline.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  RawRecord ──validate──► ValidationResult ──derive──► DerivedEntity    │
//! │  (JSON object)           (violations +               ├── User          │
//! │                           normalized fields)         └── Order         │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Rate       │   │   AgeCategory   │   │    Product      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Minor          │   │  id             │       │
//! │  │  800 = 8%       │   │  YoungAdult     │   │  name           │       │
//! │  └─────────────────┘   │  Adult          │   │  price_cents    │       │
//! │                        │  Senior         │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entities are created once by derivation or pricing and never mutated
//! afterwards; the batch result owns them until they are handed to the
//! persistence collaborator.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::money::Money;

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1500 bps = 15%. Used for discount rates, tax
/// rates and the processing fee rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for reports and display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the rate as a fraction, e.g. 0.15 (for display only).
    #[inline]
    pub fn fraction(&self) -> f64 {
        self.0 as f64 / 10_000.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percentage())
    }
}

// =============================================================================
// Age Category
// =============================================================================

/// Age bracket assigned during derivation and used for report histograms.
///
/// Cut points are 18/30/50 (see `rules::CATEGORY_BY_AGE`), which are
/// intentionally different from the discount cut points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeCategory {
    Minor,
    YoungAdult,
    Adult,
    Senior,
}

impl AgeCategory {
    /// All categories in bracket order.
    pub const ALL: [AgeCategory; 4] = [
        AgeCategory::Minor,
        AgeCategory::YoungAdult,
        AgeCategory::Adult,
        AgeCategory::Senior,
    ];

    /// Stable string key, matching the serialized form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AgeCategory::Minor => "minor",
            AgeCategory::YoungAdult => "young_adult",
            AgeCategory::Adult => "adult",
            AgeCategory::Senior => "senior",
        }
    }
}

impl fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Raw Record
// =============================================================================

/// One untyped input unit: a mapping of field name to JSON value.
///
/// The pipeline never retains a `RawRecord` past validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Wraps a JSON object map.
    pub fn new(fields: Map<String, Value>) -> Self {
        RawRecord(fields)
    }

    /// Converts an arbitrary JSON value, returning it back when it is not an
    /// object so the caller can report the malformed shape.
    pub fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Object(fields) => Ok(RawRecord(fields)),
            other => Err(other),
        }
    }

    /// Returns a field, treating JSON `null` the same as an absent field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// Builder-style field insertion (tests and the runner binary).
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Product & Catalog
// =============================================================================

/// A product that can be ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier, also the inventory ledger key.
    pub id: String,

    /// Display name frozen into line items.
    pub name: String,

    /// Unit price in cents.
    pub price_cents: i64,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            price_cents: price.cents(),
        }
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Read-only product lookup used by the checkout pipeline.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: HashMap<String, Product>,
}

impl Catalog {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Catalog {
            products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.products.get(product_id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// A reserved unit of a product inside an order.
/// Uses snapshot pattern to freeze product data at time of reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    /// Product name at time of reservation (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of reservation (frozen).
    pub unit_price_cents: i64,
}

impl LineItem {
    pub fn from_product(product: &Product) -> Self {
        LineItem {
            product_id: product.id.clone(),
            name_snapshot: product.name.clone(),
            unit_price_cents: product.price_cents,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Onboarded User
// =============================================================================

/// A user produced by the onboarding pipeline: normalized fields plus the
/// attributes computed by derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardedUser {
    pub id: String,
    /// Position of the source record in the batch input (0-based).
    pub record_index: usize,
    pub email: String,
    pub full_name: String,
    pub age: u32,
    pub phone: Option<String>,
    pub phone_formatted: Option<String>,
    pub salary: Option<Money>,
    pub discount_rate: Rate,
    pub category: AgeCategory,
    pub estimated_tax: Option<Money>,
    pub processing_fee: Option<Money>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order
// =============================================================================

/// A priced, committed order.
///
/// ## Invariant
/// `total == subtotal - discount_amount + tax_amount + shipping_cost` and
/// `total` is strictly positive. Only `pricing::PricingEngine` builds the
/// totals, so the invariant holds for every `Order` in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub record_index: usize,
    pub customer_email: String,
    pub customer_age: u32,
    pub customer_category: AgeCategory,
    pub jurisdiction: String,
    pub line_items: Vec<LineItem>,
    pub discount_code: Option<String>,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub tax_rate: Rate,
    pub tax_amount: Money,
    pub shipping_cost: Money,
    pub express_shipping: bool,
    pub total: Money,
    pub shipping_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Derived Entity
// =============================================================================

/// Which pipeline produced an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Order,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => f.write_str("user"),
            EntityKind::Order => f.write_str("order"),
        }
    }
}

/// The output of a successful pipeline run for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DerivedEntity {
    User(OnboardedUser),
    Order(Order),
}

impl DerivedEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            DerivedEntity::User(_) => EntityKind::User,
            DerivedEntity::Order(_) => EntityKind::Order,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            DerivedEntity::User(u) => &u.id,
            DerivedEntity::Order(o) => &o.id,
        }
    }

    pub fn record_index(&self) -> usize {
        match self {
            DerivedEntity::User(u) => u.record_index,
            DerivedEntity::Order(o) => o.record_index,
        }
    }

    /// Cache key, e.g. `user_<id>` or `order_<id>`.
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.kind(), self.id())
    }

    /// Contact email of the user or ordering customer.
    pub fn email(&self) -> &str {
        match self {
            DerivedEntity::User(u) => &u.email,
            DerivedEntity::Order(o) => &o.customer_email,
        }
    }

    /// Age category of the user or ordering customer.
    pub fn category(&self) -> AgeCategory {
        match self {
            DerivedEntity::User(u) => u.category,
            DerivedEntity::Order(o) => o.customer_category,
        }
    }

    pub fn as_user(&self) -> Option<&OnboardedUser> {
        match self {
            DerivedEntity::User(u) => Some(u),
            DerivedEntity::Order(_) => None,
        }
    }

    pub fn as_order(&self) -> Option<&Order> {
        match self {
            DerivedEntity::Order(o) => Some(o),
            DerivedEntity::User(_) => None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rate_conversions() {
        let rate = Rate::from_bps(1500);
        assert_eq!(rate.bps(), 1500);
        assert!((rate.percentage() - 15.0).abs() < 1e-9);
        assert!((rate.fraction() - 0.15).abs() < 1e-9);
        assert_eq!(rate.to_string(), "15%");
        assert!(Rate::default().is_zero());
    }

    #[test]
    fn test_raw_record_treats_null_as_absent() {
        let record = RawRecord::from_value(json!({"email": "a@b.co", "phone": null})).unwrap();
        assert!(record.get("email").is_some());
        assert!(record.get("phone").is_none());
        assert!(record.get("salary").is_none());
    }

    #[test]
    fn test_raw_record_rejects_non_objects() {
        assert!(RawRecord::from_value(json!([1, 2, 3])).is_err());
        assert!(RawRecord::from_value(json!("user")).is_err());
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let value = serde_json::to_value(AgeCategory::YoungAdult).unwrap();
        assert_eq!(value, json!("young_adult"));
        assert_eq!(AgeCategory::Senior.to_string(), "senior");
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = Catalog::new(vec![
            Product::new("P001", "Laptop", Money::from_cents(99_999)),
            Product::new("P002", "Mouse", Money::from_cents(2_999)),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("P002").map(|p| p.price().cents()), Some(2_999));
        assert!(catalog.get("P404").is_none());
    }
}

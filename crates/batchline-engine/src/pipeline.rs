//! # Pipelines
//!
//! What happens to one record. The orchestrator owns chunking, ordering and
//! side effects; a pipeline only turns a raw value into an entity or a
//! rejection.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OnboardingPipeline                                                     │
//! │    validate(Registration) ──► derive ──► User                           │
//! │                                                                         │
//! │  CheckoutPipeline                                                       │
//! │    validate(Checkout) ──► eligible? ──► ≤ 50 products? ──► catalog      │
//! │        ──► reserve all ──► price ──► Order                              │
//! │                   ▲            │                                        │
//! │                   └─ release ◄─┘ (on rejection)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use batchline_core::checkout::{check_eligibility, check_order_size, resolve_products};
use batchline_core::derivation::{derive, onboard};
use batchline_core::validation::{validate_value, NormalizedFields};
use batchline_core::{
    Catalog, DerivedEntity, EntityKind, LineItem, Order, PricingEngine, ValidationError,
    ValidationOptions, ValidationProfile,
};

use crate::error::Rejection;
use crate::inventory::InventoryLedger;

/// Turns one raw record into a derived entity.
#[async_trait]
pub trait Pipeline: Send + Sync {
    /// The kind of entity this pipeline produces.
    fn kind(&self) -> EntityKind;

    async fn process(
        &self,
        record: Value,
        record_index: usize,
        options: ValidationOptions,
    ) -> Result<DerivedEntity, Rejection>;
}

/// Validates `record` under `profile`, returning the normalized fields.
fn validated(
    record: &Value,
    profile: ValidationProfile,
    options: ValidationOptions,
) -> Result<NormalizedFields, Rejection> {
    let result = validate_value(record, profile, options);
    if result.is_valid() {
        Ok(result.fields)
    } else {
        Err(Rejection::Invalid(result.violations))
    }
}

// =============================================================================
// Onboarding
// =============================================================================

/// Bulk user registration.
#[derive(Debug, Default, Clone, Copy)]
pub struct OnboardingPipeline;

#[async_trait]
impl Pipeline for OnboardingPipeline {
    fn kind(&self) -> EntityKind {
        EntityKind::User
    }

    async fn process(
        &self,
        record: Value,
        record_index: usize,
        options: ValidationOptions,
    ) -> Result<DerivedEntity, Rejection> {
        let fields = validated(&record, ValidationProfile::Registration, options)?;
        onboard(&fields, record_index)
            .map(DerivedEntity::User)
            .ok_or(Rejection::Fault)
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// Order checkout against a shared inventory ledger.
#[derive(Debug, Clone)]
pub struct CheckoutPipeline {
    ledger: Arc<InventoryLedger>,
    catalog: Arc<Catalog>,
    pricing: PricingEngine,
}

impl CheckoutPipeline {
    pub fn new(ledger: Arc<InventoryLedger>, catalog: Arc<Catalog>) -> Self {
        Self::with_pricing(ledger, catalog, PricingEngine::default())
    }

    pub fn with_pricing(
        ledger: Arc<InventoryLedger>,
        catalog: Arc<Catalog>,
        pricing: PricingEngine,
    ) -> Self {
        CheckoutPipeline {
            ledger,
            catalog,
            pricing,
        }
    }

    pub fn ledger(&self) -> &Arc<InventoryLedger> {
        &self.ledger
    }

    fn checkout(&self, fields: NormalizedFields, record_index: usize) -> Result<Order, Rejection> {
        let (Some(email), Some(age), Some(jurisdiction)) =
            (fields.email, fields.age, fields.jurisdiction)
        else {
            return Err(Rejection::Fault);
        };

        check_eligibility(age)?;
        check_order_size(fields.product_ids.len())?;

        let resolved = resolve_products(&self.catalog, &fields.product_ids)?;
        if !resolved.unknown.is_empty() {
            warn!(record_index, unknown = ?resolved.unknown, "Skipping products missing from catalog");
        }

        let reservations = self
            .ledger
            .reserve_all(resolved.products.iter().map(|p| p.id.as_str()))?;
        let line_items: Vec<LineItem> = resolved
            .products
            .iter()
            .map(|p| LineItem::from_product(p))
            .collect();

        let totals = match self.pricing.price(
            &line_items,
            fields.discount_code.as_deref(),
            &jurisdiction,
            fields.express_shipping,
        ) {
            Ok(totals) => totals,
            Err(rejection) => {
                debug!(record_index, %rejection, "Pricing rejected order, releasing reservations");
                self.ledger.release_all(reservations);
                return Err(Rejection::LimitExceeded(rejection.to_string()));
            }
        };

        // Reservations stay taken; the order now owns those units.
        drop(reservations);

        Ok(Order {
            id: Uuid::new_v4().to_string(),
            record_index,
            customer_email: email,
            customer_age: age,
            customer_category: derive(age, None).category,
            jurisdiction,
            line_items,
            discount_code: fields.discount_code,
            subtotal: totals.subtotal,
            discount_amount: totals.discount_amount,
            tax_rate: totals.tax_rate,
            tax_amount: totals.tax_amount,
            shipping_cost: totals.shipping_cost,
            express_shipping: fields.express_shipping,
            total: totals.total,
            shipping_address: fields.shipping_address,
            created_at: Utc::now(),
        })
    }
}

#[async_trait]
impl Pipeline for CheckoutPipeline {
    fn kind(&self) -> EntityKind {
        EntityKind::Order
    }

    async fn process(
        &self,
        record: Value,
        record_index: usize,
        options: ValidationOptions,
    ) -> Result<DerivedEntity, Rejection> {
        let fields = validated(&record, ValidationProfile::Checkout, options)?;
        if fields.product_ids.is_empty() {
            return Err(Rejection::Invalid(vec![ValidationError::required("product_ids")]));
        }
        self.checkout(fields, record_index).map(DerivedEntity::Order)
    }
}

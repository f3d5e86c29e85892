//! # Inventory Ledger
//!
//! Per-product available quantity with an atomic reserve-or-fail operation.
//!
//! ## Concurrency Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Reserving the last unit                          │
//! │                                                                         │
//! │   task A ── fetch_update(1 → 0) ──► Ok(Reservation)                     │
//! │   task B ── fetch_update(0 → ✗) ──► Err(OutOfStock)                     │
//! │                                                                         │
//! │  • The product map is fixed at construction, so lookups need no lock   │
//! │  • Each quantity is an AtomicU64 decremented with compare-and-swap     │
//! │  • A failed reservation never touches the counter                      │
//! │  • Quantities never go below zero                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No restock path exists here; restocking belongs to whoever owns the
//! ledger's source data. The only way quantity goes back up is
//! [`InventoryLedger::release`] of a reservation this ledger handed out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::error::Rejection;

// =============================================================================
// Reservation
// =============================================================================

/// Proof that units of a product were taken from the ledger.
///
/// Not `Clone`: a reservation can be released at most once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a reservation must be kept on the order or released"]
pub struct Reservation {
    product_id: String,
    quantity: u64,
}

impl Reservation {
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Product id → available quantity.
#[derive(Debug, Default)]
pub struct InventoryLedger {
    stock: HashMap<String, AtomicU64>,
}

impl InventoryLedger {
    /// Builds a ledger from initial quantities.
    pub fn new<I, S>(initial: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        InventoryLedger {
            stock: initial
                .into_iter()
                .map(|(id, qty)| (id.into(), AtomicU64::new(qty)))
                .collect(),
        }
    }

    /// Units currently available. Unknown products report zero.
    pub fn available(&self, product_id: &str) -> u64 {
        self.stock
            .get(product_id)
            .map(|qty| qty.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    /// Atomically takes `quantity` units.
    ///
    /// A product absent from the ledger is out of stock, not an error.
    pub fn reserve(&self, product_id: &str, quantity: u64) -> Result<Reservation, Rejection> {
        let out_of_stock = || Rejection::OutOfStock {
            product_id: product_id.to_string(),
        };
        let counter = self.stock.get(product_id).ok_or_else(out_of_stock)?;

        counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |available| {
                available.checked_sub(quantity)
            })
            .map_err(|_| out_of_stock())?;

        Ok(Reservation {
            product_id: product_id.to_string(),
            quantity,
        })
    }

    /// Reserves one unit of every product id, all-or-nothing.
    ///
    /// On the first stock-out every reservation made by this call is
    /// released before the rejection is returned.
    pub fn reserve_all<'a, I>(&self, product_ids: I) -> Result<Vec<Reservation>, Rejection>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut held = Vec::new();
        for product_id in product_ids {
            match self.reserve(product_id, 1) {
                Ok(reservation) => held.push(reservation),
                Err(rejection) => {
                    debug!(product_id, rolled_back = held.len(), "Stock-out, releasing order reservations");
                    self.release_all(held);
                    return Err(rejection);
                }
            }
        }
        Ok(held)
    }

    /// Returns reserved units to the ledger.
    pub fn release(&self, reservation: Reservation) {
        if let Some(counter) = self.stock.get(&reservation.product_id) {
            counter.fetch_add(reservation.quantity, Ordering::AcqRel);
        }
    }

    pub fn release_all(&self, reservations: Vec<Reservation>) {
        for reservation in reservations {
            self.release(reservation);
        }
    }

    /// Snapshot of every product's available quantity.
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.stock
            .iter()
            .map(|(id, qty)| (id.clone(), qty.load(Ordering::Acquire)))
            .collect()
    }
}

//! # Checkout Rules
//!
//! Business gates an order passes before any inventory is touched.
//!
//! ```text
//!   validated fields
//!        │
//!        ├── age < 18?            → CoreError::Ineligible
//!        ├── > 50 product ids?    → CoreError::TooManyProducts
//!        └── catalog lookup       → unknown ids skipped
//!                 │
//!                 └── nothing left? → CoreError::EmptyOrder
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::{Catalog, Product};
use crate::{MAX_ORDER_PRODUCTS, MIN_CHECKOUT_AGE};

/// Rejects customers below the checkout age.
///
/// Distinct from the 13..=120 data-validity range: a 16-year-old is a valid
/// record but an ineligible buyer.
pub fn check_eligibility(age: u32) -> CoreResult<()> {
    if age < MIN_CHECKOUT_AGE {
        return Err(CoreError::Ineligible {
            age,
            min: MIN_CHECKOUT_AGE,
        });
    }
    Ok(())
}

/// Rejects orders naming more products than allowed.
pub fn check_order_size(product_count: usize) -> CoreResult<()> {
    if product_count > MAX_ORDER_PRODUCTS {
        return Err(CoreError::TooManyProducts {
            requested: product_count,
            max: MAX_ORDER_PRODUCTS,
        });
    }
    Ok(())
}

/// Products the catalog knows, in request order, plus the ids it did not.
#[derive(Debug, Clone, Default)]
pub struct ResolvedProducts<'a> {
    pub products: Vec<&'a Product>,
    pub unknown: Vec<String>,
}

/// Looks up each requested id. Unknown ids are skipped, not fatal; an order
/// left with no products is.
pub fn resolve_products<'a>(
    catalog: &'a Catalog,
    product_ids: &[String],
) -> CoreResult<ResolvedProducts<'a>> {
    let mut resolved = ResolvedProducts::default();
    for id in product_ids {
        match catalog.get(id) {
            Some(product) => resolved.products.push(product),
            None => resolved.unknown.push(id.clone()),
        }
    }
    if resolved.products.is_empty() {
        return Err(CoreError::EmptyOrder);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn test_eligibility_boundary() {
        assert!(matches!(
            check_eligibility(17),
            Err(CoreError::Ineligible { age: 17, min: 18 })
        ));
        assert!(check_eligibility(18).is_ok());
    }

    #[test]
    fn test_order_size_boundary() {
        assert!(check_order_size(50).is_ok());
        assert!(matches!(
            check_order_size(51),
            Err(CoreError::TooManyProducts { requested: 51, max: 50 })
        ));
    }

    #[test]
    fn test_unknown_products_are_skipped() {
        let catalog = Catalog::new(vec![Product::new("P001", "Laptop", Money::from_cents(99_999))]);
        let ids = vec!["P404".to_string(), "P001".to_string()];

        let resolved = resolve_products(&catalog, &ids).unwrap();
        assert_eq!(resolved.products.len(), 1);
        assert_eq!(resolved.products[0].id, "P001");
        assert_eq!(resolved.unknown, vec!["P404"]);

        let only_unknown = vec!["P404".to_string()];
        assert!(matches!(
            resolve_products(&catalog, &only_unknown),
            Err(CoreError::EmptyOrder)
        ));
    }
}

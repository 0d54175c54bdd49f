//! Order line item.

use serde::{Deserialize, Serialize};

use crate::money::{Money, ProductId};

/// One line item of an order: a product, a quantity, and the unit price
/// captured at saga start. Line items are never mutated after saga start
/// (data model invariant 5).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the line total (`quantity · unit_price`).
    pub fn total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_multiplies_quantity_by_unit_price() {
        let item = LineItem::new("SKU-1", 3, Money::from_cents(1000));
        assert_eq!(item.total().cents(), 3000);
    }

    #[test]
    fn serialization_roundtrip() {
        let item = LineItem::new("SKU-1", 2, Money::from_cents(500));
        let json = serde_json::to_string(&item).unwrap();
        let back: LineItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, back);
    }
}

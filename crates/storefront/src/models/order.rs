//! Order domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use magasin_core::{OrderId, OrderStatus, PaymentMethod, Price, PriceError, ProductId};

/// A line of a placed order.
///
/// This is a copy of the product's name and price at checkout time. Later
/// catalog changes never reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product the line was taken from.
    pub product_id: ProductId,
    /// Product name at checkout time.
    pub name: String,
    /// Unit price at checkout time.
    pub price: Price,
    /// Number of units.
    pub quantity: u32,
}

impl OrderItem {
    /// Unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the line total does not fit.
    pub fn line_total(&self) -> Result<Price, PriceError> {
        self.price.checked_mul(self.quantity)
    }
}

/// Where an order ships to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// An order as handed to the store, before it has an ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub total_price: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Store-assigned order ID.
    pub id: OrderId,
    /// Line snapshots, in cart order.
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    /// Total charged at checkout time.
    pub total_price: Price,
    pub status: OrderStatus,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(quantity: u32, price: &str) -> OrderItem {
        OrderItem {
            product_id: ProductId::new(1),
            name: "Desk Lamp".to_owned(),
            price: Price::parse(price).unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_item_count_is_widened() {
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(1),
            items: vec![line(u32::MAX, "1.00"), line(u32::MAX, "1.00")],
            shipping_address: ShippingAddress::default(),
            payment_method: PaymentMethod::Card,
            total_price: Price::ZERO,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(order.item_count(), 2 * u64::from(u32::MAX));
    }

    #[test]
    fn test_line_total_overflow() {
        assert_eq!(line(3, "2.50").line_total().unwrap(), Price::parse("7.50").unwrap());
        assert_eq!(
            line(u32::MAX, "79228162514264337593543950").line_total(),
            Err(PriceError::Overflow)
        );
    }
}

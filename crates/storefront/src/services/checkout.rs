//! Checkout handoff.
//!
//! Turns the current cart into a pending order and empties the cart. No
//! payment is taken; the order is a local record.
//!
//! The order write and the cart clear are independent steps. If the clear
//! fails the order still exists and clearing again is safe.

use thiserror::Error;
use tracing::{info, instrument};

use magasin_core::{OrderId, OrderStatus, PaymentMethod};

use crate::db::{self, RepositoryError, Store};
use crate::models::{NewOrder, OrderItem, ShippingAddress};
use crate::services::cart::{CartAggregator, CartError};

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    /// Required form fields that are blank, by form name.
    #[error("Please fill in: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// The cart total could not be computed, or the order was stored but
    /// the cart could not be cleared.
    #[error("cart error: {0}")]
    Cart(#[from] CartError),

    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),
}

/// The checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutForm {
    pub shipping: ShippingAddress,
    pub payment_method: PaymentMethod,
}

impl CheckoutForm {
    /// Names of the required fields that are blank, in form order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let s = &self.shipping;
        [
            ("firstName", &s.first_name),
            ("lastName", &s.last_name),
            ("email", &s.email),
            ("address", &s.address),
            ("city", &s.city),
            ("postalCode", &s.postal_code),
            ("country", &s.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Place an order for everything in `cart`.
///
/// Each cart line is copied into the order with the product's current name
/// and price; later catalog changes do not affect the order. On success the
/// cart is cleared.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` if the cart has no lines.
/// Returns `CheckoutError::MissingFields` if required fields are blank.
/// Returns `CheckoutError::Cart` with `CartError::Overflow` if the total
/// does not fit; nothing is stored.
/// Returns `CheckoutError::Repository` if the order cannot be stored.
/// Returns `CheckoutError::Cart` if the order was stored but the cart could
/// not be cleared.
#[instrument(skip(store, cart, form), fields(payment = %form.payment_method))]
pub async fn place_order(
    store: &Store,
    cart: &mut CartAggregator,
    form: CheckoutForm,
) -> Result<OrderId, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let missing = form.missing_fields();
    if !missing.is_empty() {
        return Err(CheckoutError::MissingFields(missing));
    }

    let total_price = cart.total_price()?;
    let items: Vec<OrderItem> = cart
        .items()
        .iter()
        .map(|item| OrderItem {
            product_id: item.product.id,
            name: item.product.name.clone(),
            price: item.product.price,
            quantity: item.quantity,
        })
        .collect();

    let placed_at = db::now();
    let order = NewOrder {
        items,
        shipping_address: form.shipping,
        payment_method: form.payment_method,
        total_price,
        status: OrderStatus::Pending,
        created_at: placed_at,
        updated_at: placed_at,
    };
    let order_id = store.orders().create(&order).await?;

    cart.clear_cart().await?;
    cart.close_cart();

    info!(%order_id, total = %order.total_price, "Order placed");
    Ok(order_id)
}

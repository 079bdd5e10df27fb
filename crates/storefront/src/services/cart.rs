//! Cart aggregator.
//!
//! Holds the in-memory cart view over the persisted `cart` collection and
//! enforces the rules the store leaves to its callers: one row per product,
//! and no row ever persisted with a zero quantity.
//!
//! Every mutation writes through to the store first, then reloads the view,
//! so the items and the derived totals always describe what is persisted.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use magasin_core::{CartEntryId, Price, PriceError, ProductId};

use crate::db::{RepositoryError, Store};
use crate::models::Product;

/// Largest quantity a single cart line may hold.
pub const MAX_QUANTITY: u32 = 9_999;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product is not in the catalog.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The cart entry does not exist.
    #[error("cart entry not found: {0}")]
    EntryNotFound(CartEntryId),

    /// The requested quantity is above [`MAX_QUANTITY`].
    #[error("Quantity cannot exceed {max}")]
    QuantityTooLarge { max: u32 },

    /// A line or cart total does not fit in a price.
    #[error("cart total overflow")]
    Overflow(#[from] PriceError),

    /// Repository/storage error.
    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One line of the cart view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    /// Persisted entry this line comes from.
    pub entry_id: CartEntryId,
    /// The live product.
    pub product: Product,
    /// Number of units, always positive.
    pub quantity: u32,
}

impl CartItem {
    /// Live product price times quantity.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the line total does not fit.
    pub fn line_total(&self) -> Result<Price, PriceError> {
        self.product.price.checked_mul(self.quantity)
    }
}

/// In-memory cart view backed by the store.
#[derive(Debug)]
pub struct CartAggregator {
    store: Store,
    items: Vec<CartItem>,
    is_cart_open: bool,
}

impl CartAggregator {
    /// Build the view from what is currently persisted. The panel starts
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the cart or catalog cannot be read.
    pub async fn load(store: Store) -> Result<Self, CartError> {
        let mut cart = Self {
            store,
            items: Vec::new(),
            is_cart_open: false,
        };
        cart.refresh().await?;
        Ok(cart)
    }

    /// Cart lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of all line totals at live prices.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Overflow` if a line or the total does not fit.
    pub fn total_price(&self) -> Result<Price, CartError> {
        let lines = self
            .items
            .iter()
            .map(CartItem::line_total)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Price::checked_sum(lines)?)
    }

    /// Reload the view from the store.
    ///
    /// Entries whose product is missing from the catalog are left in storage
    /// but kept out of the view and the totals.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the cart or catalog cannot be read.
    pub async fn refresh(&mut self) -> Result<(), CartError> {
        let entries = self.store.cart().get_all().await?;
        let catalog: HashMap<ProductId, Product> = self
            .store
            .products()
            .get_all()
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(product) = catalog.get(&entry.product_id).cloned() else {
                warn!(
                    entry_id = %entry.id,
                    product_id = %entry.product_id,
                    "Cart entry references an unknown product, skipping"
                );
                continue;
            };
            items.push(CartItem {
                entry_id: entry.id,
                product,
                quantity: entry.quantity,
            });
        }

        debug!(lines = items.len(), "Cart refreshed");
        self.items = items;
        Ok(())
    }

    /// Add one unit of `product`.
    ///
    /// Increments the existing line for the product, or creates one with a
    /// quantity of 1. Opens the cart panel.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product is not in the catalog.
    /// Returns `CartError::QuantityTooLarge` if the line is already full.
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(&mut self, product: &Product) -> Result<CartEntryId, CartError> {
        if self.store.products().get_by_id(product.id).await?.is_none() {
            return Err(CartError::ProductNotFound(product.id));
        }

        let cart = self.store.cart();
        let entry_id = match cart.get_by_product_id(product.id).await? {
            Some(entry) => {
                if entry.quantity >= MAX_QUANTITY {
                    return Err(CartError::QuantityTooLarge { max: MAX_QUANTITY });
                }
                cart.update(entry.id, entry.quantity + 1)
                    .await
                    .map_err(|e| entry_error(e, entry.id))?;
                entry.id
            }
            None => cart.add(product.id, 1).await?,
        };

        self.refresh().await?;
        self.open_cart();
        info!(%entry_id, "Added to cart");
        Ok(entry_id)
    }

    /// Set a line's quantity. A quantity of zero or below removes the line.
    /// Quantities above [`MAX_QUANTITY`] are rejected and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `CartError::EntryNotFound` if the entry doesn't exist.
    /// Returns `CartError::QuantityTooLarge` if `quantity` is above the limit.
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &mut self,
        entry_id: CartEntryId,
        quantity: i64,
    ) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove_from_cart(entry_id).await;
        }

        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|&quantity| quantity <= MAX_QUANTITY)
            .ok_or(CartError::QuantityTooLarge { max: MAX_QUANTITY })?;
        self.store
            .cart()
            .update(entry_id, quantity)
            .await
            .map_err(|e| entry_error(e, entry_id))?;
        self.refresh().await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::EntryNotFound` if the entry doesn't exist.
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&mut self, entry_id: CartEntryId) -> Result<(), CartError> {
        self.store
            .cart()
            .remove(entry_id)
            .await
            .map_err(|e| entry_error(e, entry_id))?;
        self.refresh().await
    }

    /// Remove every line. Clearing an empty cart is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&mut self) -> Result<(), CartError> {
        let removed = self.store.cart().clear().await?;
        self.items.clear();
        info!(removed, "Cart cleared");
        Ok(())
    }

    // Panel state. None of these touch storage.

    /// Whether the cart panel is open.
    #[must_use]
    pub const fn is_cart_open(&self) -> bool {
        self.is_cart_open
    }

    pub const fn open_cart(&mut self) {
        self.is_cart_open = true;
    }

    pub const fn close_cart(&mut self) {
        self.is_cart_open = false;
    }

    pub const fn toggle_cart(&mut self) {
        self.is_cart_open = !self.is_cart_open;
    }

    pub const fn set_cart_open(&mut self, open: bool) {
        self.is_cart_open = open;
    }
}

fn entry_error(error: RepositoryError, entry_id: CartEntryId) -> CartError {
    match error {
        RepositoryError::NotFound => CartError::EntryNotFound(entry_id),
        other => CartError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i64, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::parse(price).unwrap(),
            category: "Test".to_owned(),
            image: format!("/images/{id}.jpg"),
            description: String::new(),
        }
    }

    async fn cart_with(catalog: &[Product]) -> (Store, CartAggregator) {
        let store = Store::in_memory().await.unwrap();
        store.initialize(catalog).await.unwrap();
        let cart = CartAggregator::load(store.clone()).await.unwrap();
        (store, cart)
    }

    #[tokio::test]
    async fn test_repeated_adds_keep_one_row_per_product() {
        let tee = product(1, "10.00");
        let (store, mut cart) = cart_with(&[tee.clone()]).await;

        let first = cart.add_to_cart(&tee).await.unwrap();
        for _ in 0..4 {
            assert_eq!(cart.add_to_cart(&tee).await.unwrap(), first);
        }

        let rows = store.cart().get_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 5);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_items(), 5);
    }

    #[tokio::test]
    async fn test_totals() {
        let a = product(1, "10.00");
        let b = product(2, "5.50");
        let (_store, mut cart) = cart_with(&[a.clone(), b.clone()]).await;

        cart.add_to_cart(&a).await.unwrap();
        cart.add_to_cart(&a).await.unwrap();
        for _ in 0..3 {
            cart.add_to_cart(&b).await.unwrap();
        }

        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.total_price().unwrap(), Price::parse("36.50").unwrap());
        assert_eq!(cart.items()[1].line_total().unwrap(), Price::parse("16.50").unwrap());
    }

    #[tokio::test]
    async fn test_zero_and_negative_quantity_remove_the_line() {
        let a = product(1, "10.00");
        let b = product(2, "5.50");
        let (store, mut cart) = cart_with(&[a.clone(), b.clone()]).await;
        let a_entry = cart.add_to_cart(&a).await.unwrap();
        let b_entry = cart.add_to_cart(&b).await.unwrap();

        cart.update_quantity(a_entry, 0).await.unwrap();
        assert_eq!(cart.total_items(), 1);
        assert_eq!(cart.total_price().unwrap(), Price::parse("5.50").unwrap());

        cart.update_quantity(b_entry, -3).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price().unwrap(), Price::ZERO);
        assert!(store.cart().get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_sets_value() {
        let a = product(1, "2.00");
        let (_store, mut cart) = cart_with(&[a.clone()]).await;
        let entry = cart.add_to_cart(&a).await.unwrap();

        cart.update_quantity(entry, 7).await.unwrap();
        assert_eq!(cart.total_items(), 7);
        assert_eq!(cart.total_price().unwrap(), Price::parse("14.00").unwrap());
    }

    #[tokio::test]
    async fn test_quantity_above_limit_is_rejected() {
        let a = product(1, "2.00");
        let (store, mut cart) = cart_with(&[a.clone()]).await;
        let entry = cart.add_to_cart(&a).await.unwrap();
        cart.update_quantity(entry, 3).await.unwrap();

        for quantity in [i64::from(MAX_QUANTITY) + 1, 5_000_000_000, i64::MAX] {
            assert!(matches!(
                cart.update_quantity(entry, quantity).await,
                Err(CartError::QuantityTooLarge { max: MAX_QUANTITY })
            ));
        }
        assert_eq!(store.cart().get_all().await.unwrap()[0].quantity, 3);
        assert_eq!(cart.total_items(), 3);

        cart.update_quantity(entry, i64::from(MAX_QUANTITY)).await.unwrap();
        assert!(matches!(
            cart.add_to_cart(&a).await,
            Err(CartError::QuantityTooLarge { .. })
        ));
        assert_eq!(store.cart().get_all().await.unwrap()[0].quantity, MAX_QUANTITY);
    }

    #[tokio::test]
    async fn test_item_count_does_not_wrap() {
        let a = product(1, "1.00");
        let b = product(2, "1.00");
        let (store, _) = cart_with(&[a, b]).await;
        store.cart().add(ProductId::new(1), u32::MAX).await.unwrap();
        store.cart().add(ProductId::new(2), 2).await.unwrap();

        let cart = CartAggregator::load(store).await.unwrap();
        assert_eq!(cart.total_items(), u64::from(u32::MAX) + 2);
    }

    #[tokio::test]
    async fn test_price_overflow_is_an_error() {
        let a = product(1, "10000000000000000000000000");
        let b = product(2, "1.00");
        let (_store, mut cart) = cart_with(&[a.clone(), b.clone()]).await;
        let entry = cart.add_to_cart(&a).await.unwrap();
        cart.add_to_cart(&b).await.unwrap();
        assert_eq!(
            cart.total_price().unwrap(),
            Price::parse("10000000000000000000000001").unwrap()
        );

        cart.update_quantity(entry, i64::from(MAX_QUANTITY)).await.unwrap();
        assert_eq!(cart.items()[0].line_total(), Err(PriceError::Overflow));
        assert!(matches!(
            cart.total_price(),
            Err(CartError::Overflow(PriceError::Overflow))
        ));
    }

    #[tokio::test]
    async fn test_missing_entry_and_product() {
        let a = product(1, "2.00");
        let (_store, mut cart) = cart_with(&[a]).await;
        let missing = CartEntryId::new(99);

        assert!(matches!(
            cart.update_quantity(missing, 2).await,
            Err(CartError::EntryNotFound(id)) if id == missing
        ));
        assert!(matches!(
            cart.remove_from_cart(missing).await,
            Err(CartError::EntryNotFound(_))
        ));
        assert!(matches!(
            cart.update_quantity(missing, 0).await,
            Err(CartError::EntryNotFound(_))
        ));

        let ghost = product(42, "1.00");
        assert!(matches!(
            cart.add_to_cart(&ghost).await,
            Err(CartError::ProductNotFound(id)) if id == ghost.id
        ));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_totals_follow_live_price() {
        let a = product(1, "10.00");
        let (store, mut cart) = cart_with(&[a.clone()]).await;
        cart.add_to_cart(&a).await.unwrap();
        cart.add_to_cart(&a).await.unwrap();

        store
            .products()
            .update_price(a.id, Price::parse("12.00").unwrap())
            .await
            .unwrap();
        cart.refresh().await.unwrap();

        assert_eq!(cart.total_price().unwrap(), Price::parse("24.00").unwrap());
    }

    #[tokio::test]
    async fn test_entry_for_unknown_product_is_skipped() {
        let a = product(1, "3.00");
        let (store, _) = cart_with(&[a]).await;
        store.cart().add(ProductId::new(1), 2).await.unwrap();
        store.cart().add(ProductId::new(500), 4).await.unwrap();

        let cart = CartAggregator::load(store.clone()).await.unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total_items(), 2);
        assert_eq!(store.cart().get_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_clear_and_reload() {
        let a = product(1, "3.00");
        let b = product(2, "4.00");
        let (store, mut cart) = cart_with(&[a.clone(), b.clone()]).await;
        cart.add_to_cart(&a).await.unwrap();
        cart.add_to_cart(&b).await.unwrap();

        let reloaded = CartAggregator::load(store.clone()).await.unwrap();
        assert_eq!(reloaded.items(), cart.items());

        cart.clear_cart().await.unwrap();
        cart.clear_cart().await.unwrap();
        assert!(cart.is_empty());
        assert!(store.cart().get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_panel_flag() {
        let a = product(1, "3.00");
        let (store, mut cart) = cart_with(&[a.clone()]).await;
        assert!(!cart.is_cart_open());

        cart.toggle_cart();
        assert!(cart.is_cart_open());
        cart.close_cart();
        assert!(!cart.is_cart_open());
        cart.set_cart_open(true);
        cart.set_cart_open(false);
        assert!(store.cart().get_all().await.unwrap().is_empty());

        cart.add_to_cart(&a).await.unwrap();
        assert!(cart.is_cart_open());
    }
}

//! Order repository.
//!
//! Line items and the shipping address are stored as JSON text. They are
//! snapshots taken at checkout and are never rewritten; only `status` and
//! `updated_at` change after creation.

use sqlx::SqlitePool;
use tracing::{info, instrument};

use magasin_core::{OrderId, OrderStatus, PaymentMethod, Price};

use super::{RepositoryError, decode_timestamp, encode_timestamp};
use crate::models::{NewOrder, Order, OrderItem, ShippingAddress};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    items: String,
    shipping_address: String,
    payment_method: String,
    total_price: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("invalid {what} for order {}: {e}", row.id))
        };

        let items: Vec<OrderItem> =
            serde_json::from_str(&row.items).map_err(|e| corrupt("items", &e))?;
        let shipping_address: ShippingAddress = serde_json::from_str(&row.shipping_address)
            .map_err(|e| corrupt("shipping address", &e))?;
        let payment_method: PaymentMethod = row
            .payment_method
            .parse()
            .map_err(|e: String| corrupt("payment method", &e))?;
        let total_price = Price::parse(&row.total_price).map_err(|e| corrupt("total price", &e))?;
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|e: String| corrupt("status", &e))?;

        Ok(Self {
            id: OrderId::new(row.id),
            items,
            shipping_address,
            payment_method,
            total_price,
            status,
            created_at: decode_timestamp(&row.created_at)?,
            updated_at: decode_timestamp(&row.updated_at)?,
        })
    }
}

const SELECT_ORDER: &str = "SELECT id, items, shipping_address, payment_method, total_price, status, created_at, updated_at FROM orders";

/// Repository for the `orders` collection.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new order and return its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the order cannot be serialized.
    /// Returns `RepositoryError::Database` for database errors.
    #[instrument(skip(self, order), fields(items = order.items.len(), total = %order.total_price))]
    pub async fn create(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let items = serde_json::to_string(&order.items).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize order items: {e}"))
        })?;
        let shipping_address = serde_json::to_string(&order.shipping_address).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize shipping address: {e}"))
        })?;

        let result = sqlx::query(
            "INSERT INTO orders (items, shipping_address, payment_method, total_price, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(items)
        .bind(shipping_address)
        .bind(order.payment_method.as_str())
        .bind(order.total_price.amount().to_string())
        .bind(order.status.as_str())
        .bind(encode_timestamp(order.created_at))
        .bind(encode_timestamp(order.updated_at))
        .execute(self.pool)
        .await?;

        let id = OrderId::new(result.last_insert_rowid());
        info!(order_id = %id, "Order created");
        Ok(id)
    }

    /// All orders, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if any stored order is invalid.
    pub async fn get_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{SELECT_ORDER} ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    /// Get an order by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored order is invalid.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE id = ?"))
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    /// Move an order to `status` and refresh its `updated_at`.
    ///
    /// The read and the write run in one transaction so the transition is
    /// checked against the status actually being replaced.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::InvalidTransition` if the lifecycle forbids the move.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: String = sqlx::query_scalar("SELECT status FROM orders WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let current: OrderStatus = current.parse().map_err(|e: String| {
            RepositoryError::DataCorruption(format!("invalid status for order {id}: {e}"))
        })?;
        current.transition_to(status)?;

        sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(encode_timestamp(super::now()))
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE id = ?"))
            .bind(id.as_i64())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(order_id = %id, from = %current, to = %status, "Order status updated");
        Order::try_from(row)
    }
}

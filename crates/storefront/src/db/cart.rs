//! Cart repository.
//!
//! A plain persisted collection: `add` always inserts and `update` writes
//! whatever quantity it is given. Keeping one row per product and never
//! storing a zero quantity is the job of
//! [`CartAggregator`](crate::services::cart::CartAggregator).

use sqlx::SqlitePool;
use tracing::instrument;

use magasin_core::{CartEntryId, ProductId};

use super::RepositoryError;
use crate::models::CartEntry;

#[derive(sqlx::FromRow)]
struct CartRow {
    id: i64,
    product_id: i64,
    quantity: i64,
}

impl TryFrom<CartRow> for CartEntry {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "invalid quantity {} for cart entry {}",
                row.quantity, row.id
            ))
        })?;

        Ok(Self {
            id: CartEntryId::new(row.id),
            product_id: ProductId::new(row.product_id),
            quantity,
        })
    }
}

/// Repository for the `cart` collection.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All cart rows, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored quantity is invalid.
    pub async fn get_all(&self) -> Result<Vec<CartEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartRow>(
            "SELECT id, product_id, quantity FROM cart ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;
        rows.into_iter().map(CartEntry::try_from).collect()
    }

    /// Insert a new row and return its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self))]
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<CartEntryId, RepositoryError> {
        let result = sqlx::query("INSERT INTO cart (product_id, quantity) VALUES (?, ?)")
            .bind(product_id.as_i64())
            .bind(i64::from(quantity))
            .execute(self.pool)
            .await?;
        Ok(CartEntryId::new(result.last_insert_rowid()))
    }

    /// Set a row's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self))]
    pub async fn update(&self, id: CartEntryId, quantity: u32) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE cart SET quantity = ? WHERE id = ?")
            .bind(i64::from(quantity))
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: CartEntryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete every row. Clearing an empty cart is not an error.
    ///
    /// # Returns
    ///
    /// The number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart").execute(self.pool).await?;
        Ok(result.rows_affected())
    }

    /// The first row for `product_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored quantity is invalid.
    pub async fn get_by_product_id(
        &self,
        product_id: ProductId,
    ) -> Result<Option<CartEntry>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, product_id, quantity FROM cart WHERE product_id = ? ORDER BY id LIMIT 1",
        )
        .bind(product_id.as_i64())
        .fetch_optional(self.pool)
        .await?;
        row.map(CartEntry::try_from).transpose()
    }
}

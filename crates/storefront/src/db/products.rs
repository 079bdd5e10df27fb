//! Product repository.
//!
//! The catalog is read-only to the rest of the core. The only writes are the
//! seed insert and [`ProductRepository::update_price`] for catalog
//! maintenance.

use sqlx::sqlite::SqliteQueryResult;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{info, instrument};

use magasin_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::Product;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: String,
    category: String,
    image: String,
    description: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::parse(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            price,
            category: row.category,
            image: row.image,
            description: row.description,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

const SELECT_PRODUCT: &str = "SELECT id, name, price, category, image, description FROM products";

/// Insert a product with its feed-assigned id. Existing ids are left alone.
pub(super) async fn insert<'e, E>(executor: E, product: &Product) -> Result<SqliteQueryResult, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT OR IGNORE INTO products (id, name, price, category, image, description)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(product.id.as_i64())
    .bind(&product.name)
    .bind(product.price.amount().to_string())
    .bind(&product.category)
    .bind(&product.image)
    .bind(&product.description)
    .execute(executor)
    .await
}

/// Repository for the `products` collection.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All products, by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn get_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} ORDER BY id"))
            .fetch_all(self.pool)
            .await?;
        into_products(rows)
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored price is invalid.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} WHERE id = ?"))
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;
        row.map(Product::try_from).transpose()
    }

    /// Products in one category (exact match), by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn get_by_category(&self, category: &str) -> Result<Vec<Product>, RepositoryError> {
        let rows =
            sqlx::query_as::<_, ProductRow>(&format!("{SELECT_PRODUCT} WHERE category = ? ORDER BY id"))
                .bind(category)
                .fetch_all(self.pool)
                .await?;
        into_products(rows)
    }

    /// Products whose name or description contains `query`, ignoring case.
    ///
    /// Matching is done in Rust so that it follows Unicode lower-casing
    /// rather than `SQLite`'s ASCII-only `LIKE`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, RepositoryError> {
        let products = self.get_all().await?;
        Ok(products.into_iter().filter(|p| p.matches(query)).collect())
    }

    /// Distinct categories, sorted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories =
            sqlx::query_scalar("SELECT DISTINCT category FROM products ORDER BY category")
                .fetch_all(self.pool)
                .await?;
        Ok(categories)
    }

    /// Number of products in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Change a product's catalog price.
    ///
    /// Placed orders keep the price they were placed at; carts pick up the
    /// new price on their next refresh.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self))]
    pub async fn update_price(&self, id: ProductId, price: Price) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE products SET price = ? WHERE id = ?")
            .bind(price.amount().to_string())
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        info!(product_id = %id, %price, "Product price updated");
        Ok(())
    }
}

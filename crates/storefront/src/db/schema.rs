//! Versioned schema for the store's collections.
//!
//! Each [`SchemaVersion`] declares the full set of collections as of that
//! version. Migrating to a version only ever adds: missing tables are
//! created, missing columns are appended and declared indexes are built.
//! Nothing is dropped or retyped, so data written under an older version is
//! carried forward untouched.
//!
//! The applied version is kept in `PRAGMA user_version`.

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, instrument};

use super::RepositoryError;

/// How a collection's `id` column is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// The caller supplies the id (seeded products).
    Assigned,
    /// The store assigns increasing ids that are never reused.
    AutoIncrement,
}

/// A non-key column of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    /// SQL type and constraints, e.g. `"TEXT NOT NULL"`.
    pub sql_type: &'static str,
    /// SQL literal used as `DEFAULT`. Required for `NOT NULL` columns added
    /// to a table that already exists.
    pub default: Option<&'static str>,
}

impl Column {
    #[must_use]
    pub const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            default: None,
        }
    }

    #[must_use]
    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    fn definition(&self) -> String {
        match self.default {
            Some(default) => format!("{} {} DEFAULT {default}", self.name, self.sql_type),
            None => format!("{} {}", self.name, self.sql_type),
        }
    }
}

/// A named, typed group of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    pub name: &'static str,
    pub key: KeyKind,
    pub columns: &'static [Column],
    /// Fields with a secondary index.
    pub indexes: &'static [&'static str],
}

impl Collection {
    fn create_table_sql(&self) -> String {
        let key = match self.key {
            KeyKind::Assigned => "id INTEGER PRIMARY KEY",
            KeyKind::AutoIncrement => "id INTEGER PRIMARY KEY AUTOINCREMENT",
        };
        let columns = std::iter::once(key.to_owned())
            .chain(self.columns.iter().map(Column::definition))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({columns})", self.name)
    }
}

/// The collections as of one schema version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVersion {
    pub version: u32,
    pub collections: Vec<Collection>,
}

/// Ordered list of schema versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    versions: Vec<SchemaVersion>,
}

const PRODUCTS_V1: Collection = Collection {
    name: "products",
    key: KeyKind::Assigned,
    columns: &[
        Column::new("name", "TEXT NOT NULL"),
        Column::new("price", "TEXT NOT NULL"),
        Column::new("category", "TEXT NOT NULL"),
        Column::new("image", "TEXT NOT NULL").with_default("''"),
        Column::new("description", "TEXT NOT NULL").with_default("''"),
    ],
    indexes: &["name", "category", "price"],
};

const ORDERS_V1: Collection = Collection {
    name: "orders",
    key: KeyKind::AutoIncrement,
    columns: &[
        Column::new("items", "TEXT NOT NULL"),
        Column::new("shipping_address", "TEXT NOT NULL"),
        Column::new("payment_method", "TEXT NOT NULL"),
        Column::new("total_price", "TEXT NOT NULL"),
        Column::new("status", "TEXT NOT NULL"),
        Column::new("created_at", "TEXT NOT NULL"),
        Column::new("updated_at", "TEXT NOT NULL"),
    ],
    indexes: &["status", "created_at"],
};

const CART_V1: Collection = Collection {
    name: "cart",
    key: KeyKind::AutoIncrement,
    columns: &[
        Column::new("product_id", "INTEGER NOT NULL"),
        Column::new("quantity", "INTEGER NOT NULL"),
    ],
    indexes: &["product_id"],
};

impl Schema {
    /// Build a schema from versions.
    ///
    /// Versions are sorted by number; each must be greater than zero.
    #[must_use]
    pub fn new(mut versions: Vec<SchemaVersion>) -> Self {
        versions.sort_by_key(|v| v.version);
        Self { versions }
    }

    /// The schema this build of the store reads and writes.
    #[must_use]
    pub fn current() -> Self {
        Self::new(vec![SchemaVersion {
            version: 1,
            collections: vec![PRODUCTS_V1, ORDERS_V1, CART_V1],
        }])
    }

    /// Highest declared version (0 for an empty schema).
    #[must_use]
    pub fn latest_version(&self) -> u32 {
        self.versions.last().map_or(0, |v| v.version)
    }

    /// Bring the database forward to [`Schema::latest_version`].
    ///
    /// Each pending version is applied in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the database reports a
    /// version newer than this schema knows, and `RepositoryError::Database`
    /// if a statement fails.
    #[instrument(skip(self, pool), fields(latest = self.latest_version()))]
    pub async fn migrate(&self, pool: &SqlitePool) -> Result<(), RepositoryError> {
        let applied = applied_version(pool).await?;
        let latest = i64::from(self.latest_version());
        if applied > latest {
            return Err(RepositoryError::DataCorruption(format!(
                "database schema version {applied} is newer than supported version {latest}"
            )));
        }

        for version in self
            .versions
            .iter()
            .filter(|v| i64::from(v.version) > applied)
        {
            let mut tx = pool.begin().await?;
            for collection in &version.collections {
                apply_collection(&mut tx, collection).await?;
            }
            let pragma = format!("PRAGMA user_version = {}", version.version);
            sqlx::query(&pragma).execute(&mut *tx).await?;
            tx.commit().await?;

            info!(version = version.version, "Applied schema version");
        }

        Ok(())
    }
}

/// Read the schema version recorded in the database (0 for a new file).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the pragma cannot be read.
pub async fn applied_version(pool: &SqlitePool) -> Result<i64, RepositoryError> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

async fn apply_collection(
    tx: &mut Transaction<'_, Sqlite>,
    collection: &Collection,
) -> Result<(), RepositoryError> {
    let existing: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
        .bind(collection.name)
        .fetch_all(&mut **tx)
        .await?;

    if existing.is_empty() {
        sqlx::query(&collection.create_table_sql())
            .execute(&mut **tx)
            .await?;
        debug!(collection = collection.name, "Created collection");
    } else {
        for column in collection
            .columns
            .iter()
            .filter(|c| !existing.iter().any(|name| name == c.name))
        {
            let sql = format!(
                "ALTER TABLE {} ADD COLUMN {}",
                collection.name,
                column.definition()
            );
            sqlx::query(&sql).execute(&mut **tx).await?;
            debug!(
                collection = collection.name,
                column = column.name,
                "Added column"
            );
        }
    }

    for field in collection.indexes {
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_{field} ON {table} ({field})",
            table = collection.name
        );
        sqlx::query(&sql).execute(&mut **tx).await?;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    const ORDERS_V2: Collection = Collection {
        name: "orders",
        key: KeyKind::AutoIncrement,
        columns: &[
            Column::new("items", "TEXT NOT NULL"),
            Column::new("shipping_address", "TEXT NOT NULL"),
            Column::new("payment_method", "TEXT NOT NULL"),
            Column::new("total_price", "TEXT NOT NULL"),
            Column::new("status", "TEXT NOT NULL"),
            Column::new("created_at", "TEXT NOT NULL"),
            Column::new("updated_at", "TEXT NOT NULL"),
            Column::new("gift_note", "TEXT NOT NULL").with_default("''"),
        ],
        indexes: &["status", "created_at", "payment_method"],
    };

    const WISHLIST_V2: Collection = Collection {
        name: "wishlist",
        key: KeyKind::AutoIncrement,
        columns: &[Column::new("product_id", "INTEGER NOT NULL")],
        indexes: &["product_id"],
    };

    fn schema_v2() -> Schema {
        let mut versions = vec![SchemaVersion {
            version: 2,
            collections: vec![PRODUCTS_V1, ORDERS_V2, CART_V1, WISHLIST_V2],
        }];
        versions.extend(Schema::current().versions);
        Schema::new(versions)
    }

    async fn index_names(pool: &SqlitePool) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'index' ORDER BY name")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_current_schema_creates_declared_indexes() {
        let pool = create_pool("sqlite::memory:", 1).await.unwrap();
        Schema::current().migrate(&pool).await.unwrap();

        assert_eq!(applied_version(&pool).await.unwrap(), 1);
        let indexes = index_names(&pool).await;
        for expected in [
            "idx_cart_product_id",
            "idx_orders_created_at",
            "idx_orders_status",
            "idx_products_category",
            "idx_products_name",
            "idx_products_price",
        ] {
            assert!(indexes.iter().any(|i| i == expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let pool = create_pool("sqlite::memory:", 1).await.unwrap();
        Schema::current().migrate(&pool).await.unwrap();
        Schema::current().migrate(&pool).await.unwrap();
        assert_eq!(applied_version(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_forward_migration_keeps_existing_rows() {
        let pool = create_pool("sqlite::memory:", 1).await.unwrap();
        Schema::current().migrate(&pool).await.unwrap();

        sqlx::query(
            "INSERT INTO orders (items, shipping_address, payment_method, total_price, status, created_at, updated_at)
             VALUES ('[]', '{}', 'card', '12.00', 'pending', '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z')",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO cart (product_id, quantity) VALUES (3, 2)")
            .execute(&pool)
            .await
            .unwrap();

        schema_v2().migrate(&pool).await.unwrap();
        assert_eq!(applied_version(&pool).await.unwrap(), 2);

        let (total, note): (String, String) =
            sqlx::query_as("SELECT total_price, gift_note FROM orders")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(total, "12.00");
        assert_eq!(note, "");

        let quantity: i64 = sqlx::query_scalar("SELECT quantity FROM cart WHERE product_id = 3")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(quantity, 2);

        let indexes = index_names(&pool).await;
        assert!(indexes.iter().any(|i| i == "idx_orders_payment_method"));
        assert!(indexes.iter().any(|i| i == "idx_wishlist_product_id"));
    }

    #[tokio::test]
    async fn test_newer_database_is_refused() {
        let pool = create_pool("sqlite::memory:", 1).await.unwrap();
        schema_v2().migrate(&pool).await.unwrap();

        let result = Schema::current().migrate(&pool).await;
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
    }

    #[test]
    fn test_versions_are_sorted() {
        let schema = schema_v2();
        assert_eq!(schema.latest_version(), 2);
        assert_eq!(schema.versions[0].version, 1);
    }
}

//! Local persistent store.
//!
//! # Database: one `SQLite` file per client
//!
//! ## Collections (versioned, see [`schema`])
//!
//! - `products` - Catalog, seeded once from the product feed
//! - `orders` - Placed orders with snapshotted line items
//! - `cart` - Persisted cart rows
//!
//! ## Key-value substrate (unversioned)
//!
//! - `local_storage` - Named text blobs (credential table, current session),
//!   read and written through [`UserRepository`]
//!
//! # Migrations
//!
//! Schema versions are declared in code and applied forward when the store is
//! opened. See [`schema::Schema::current`].

pub mod cart;
pub mod local_storage;
pub mod orders;
pub mod products;
pub mod schema;
pub mod seed;
pub mod users;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use magasin_core::StatusTransitionError;

pub use cart::CartRepository;
pub use local_storage::LocalStorage;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use schema::Schema;
pub use users::UserRepository;

use crate::models::Product;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The storage medium failed (unavailable, full, locked).
    #[error("storage error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored data could not be decoded.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested record was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// An order status change that the lifecycle does not allow.
    #[error(transparent)]
    InvalidTransition(#[from] StatusTransitionError),
}

/// Result of [`Store::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The catalog was empty and the feed was loaded.
    Seeded {
        /// Number of products written.
        inserted: u64,
    },
    /// Products were already present; nothing was written.
    AlreadySeeded {
        /// Number of products found.
        existing: i64,
    },
}

/// The local persistent store.
///
/// Cheap to clone: clones share the connection pool and the seed lock.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
    seed_lock: Arc<Mutex<()>>,
}

impl Store {
    /// Open (or create) the store at `database_url` and bring its schema up
    /// to the current version.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database cannot be opened
    /// or migrated, and `RepositoryError::DataCorruption` if it was written by
    /// a newer schema version.
    pub async fn open(database_url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        Self::open_with_schema(database_url, max_connections, &Schema::current()).await
    }

    /// Open a private in-memory store. Nothing survives the process.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if `SQLite` cannot be initialized.
    pub async fn in_memory() -> Result<Self, RepositoryError> {
        Self::open(MEMORY_URL, 1).await
    }

    /// Open the store and migrate it to `schema`.
    ///
    /// # Errors
    ///
    /// See [`Store::open`].
    pub async fn open_with_schema(
        database_url: &str,
        max_connections: u32,
        schema: &Schema,
    ) -> Result<Self, RepositoryError> {
        let pool = create_pool(database_url, max_connections).await?;
        schema.migrate(&pool).await?;
        local_storage::ensure_table(&pool).await?;

        Ok(Self {
            pool,
            seed_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The `products` collection.
    #[must_use]
    pub const fn products(&self) -> ProductRepository<'_> {
        ProductRepository::new(&self.pool)
    }

    /// The `orders` collection.
    #[must_use]
    pub const fn orders(&self) -> OrderRepository<'_> {
        OrderRepository::new(&self.pool)
    }

    /// The `cart` collection.
    #[must_use]
    pub const fn cart(&self) -> CartRepository<'_> {
        CartRepository::new(&self.pool)
    }

    /// The key-value substrate shared with the session manager.
    #[must_use]
    pub fn local_storage(&self) -> LocalStorage {
        LocalStorage::new(self.pool.clone())
    }

    /// Seed the catalog if it is empty.
    ///
    /// Idempotent. Overlapping calls on clones of the same store are
    /// serialized, so the "is it empty" check and the insert behave as one
    /// step and the catalog is never loaded twice.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the count or the insert fails.
    /// A failed insert leaves the catalog empty.
    #[instrument(skip(self, catalog), fields(catalog_len = catalog.len()))]
    pub async fn initialize(&self, catalog: &[Product]) -> Result<SeedOutcome, RepositoryError> {
        let _guard = self.seed_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            return Ok(SeedOutcome::AlreadySeeded { existing });
        }

        let mut inserted = 0;
        for product in catalog {
            inserted += products::insert(&mut *tx, product).await?.rows_affected();
        }
        tx.commit().await?;

        info!(inserted, "Database initialized with products");
        Ok(SeedOutcome::Seeded { inserted })
    }
}

const MEMORY_URL: &str = "sqlite::memory:";

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// In-memory databases live and die with their connection, so they get a
/// single connection that is never recycled.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the database cannot be opened.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    if is_memory_url(database_url) {
        return SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await;
    }

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options.journal_mode(SqliteJournalMode::Wal))
        .await
}

/// Current time at the precision timestamps are stored with.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339, so text order matches time order.
pub(crate) fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid timestamp {raw:?}: {e}")))
}

//! Key-value substrate for named text blobs.
//!
//! Lives in the same database file as the collections but outside the
//! versioned schema: the table is created if missing and never migrated.

use sqlx::SqlitePool;
use tracing::instrument;

use super::RepositoryError;

/// Create the `local_storage` table if it does not exist yet.
pub(super) async fn ensure_table(pool: &SqlitePool) -> Result<(), RepositoryError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS local_storage (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Named text slots, in the spirit of a browser's `localStorage`.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    pool: SqlitePool,
}

impl LocalStorage {
    /// Wrap a pool whose database already has the `local_storage` table.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read a slot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    pub async fn get_item(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let value = sqlx::query_scalar("SELECT value FROM local_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    /// Write a slot, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    #[instrument(skip(self, value), fields(len = value.len()))]
    pub async fn set_item(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO local_storage (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a slot. Deleting a missing slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, key: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM local_storage WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::db::Store;

    #[tokio::test]
    async fn test_set_get_replace_remove() {
        let store = Store::in_memory().await.unwrap();
        let storage = store.local_storage();

        assert_eq!(storage.get_item("greeting").await.unwrap(), None);

        storage.set_item("greeting", "bonjour").await.unwrap();
        storage.set_item("greeting", "salut").await.unwrap();
        assert_eq!(
            storage.get_item("greeting").await.unwrap().as_deref(),
            Some("salut")
        );

        storage.remove_item("greeting").await.unwrap();
        storage.remove_item("greeting").await.unwrap();
        assert_eq!(storage.get_item("greeting").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_slots_are_shared_between_clones() {
        let store = Store::in_memory().await.unwrap();
        store.local_storage().set_item("k", "v").await.unwrap();
        assert_eq!(
            store.clone().local_storage().get_item("k").await.unwrap().as_deref(),
            Some("v")
        );
    }
}

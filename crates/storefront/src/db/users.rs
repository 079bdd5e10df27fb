//! User repository for local storage operations.
//!
//! This module reads and writes the two authentication blobs: the credential
//! table and the current session. Both are JSON text in [`LocalStorage`].
//! Decoding is strict; deciding what to do with a corrupt blob is left to
//! the caller.

use std::collections::BTreeMap;

use magasin_core::Email;

use super::{LocalStorage, RepositoryError};
use crate::models::session::keys;
use crate::models::{CurrentUser, StoredCredential};

/// Normalized email → credential.
pub type CredentialTable = BTreeMap<Email, StoredCredential>;

/// Repository for local user credentials and the persisted session.
pub struct UserRepository<'a> {
    storage: &'a LocalStorage,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(storage: &'a LocalStorage) -> Self {
        Self { storage }
    }

    /// Read the whole credential table. A missing table is empty.
    ///
    /// Keys are normalized on the way in. If two stored keys normalize to
    /// the same email, the one already in normalized form wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    /// Returns `RepositoryError::DataCorruption` if the stored table is not valid JSON.
    pub async fn get_credentials(&self) -> Result<CredentialTable, RepositoryError> {
        let Some(raw) = self.storage.get_item(keys::USERS).await? else {
            return Ok(CredentialTable::new());
        };

        let stored: BTreeMap<String, StoredCredential> = serde_json::from_str(&raw)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid credential table: {e}")))?;

        let mut table = CredentialTable::new();
        for (key, credential) in stored {
            let email = Email::normalize(&key);
            if email.as_str() == key {
                table.insert(email, credential);
            } else {
                table.entry(email).or_insert(credential);
            }
        }
        Ok(table)
    }

    /// Get the credential for a normalized email.
    ///
    /// # Errors
    ///
    /// See [`UserRepository::get_credentials`].
    pub async fn get_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredential>, RepositoryError> {
        let mut table = self.get_credentials().await?;
        Ok(table.remove(email))
    }

    /// Add a credential for a new email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already has a credential.
    /// Returns `RepositoryError::DataCorruption` if the stored table is unreadable;
    /// it is never overwritten.
    /// Returns `RepositoryError::Database` if the read or write fails.
    pub async fn create(
        &self,
        email: &Email,
        credential: StoredCredential,
    ) -> Result<(), RepositoryError> {
        let mut table = self.get_credentials().await?;
        if table.contains_key(email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        table.insert(email.clone(), credential);

        let raw = serde_json::to_string(&table).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize credential table: {e}"))
        })?;
        self.storage.set_item(keys::USERS, &raw).await
    }

    /// Read the persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the read fails.
    /// Returns `RepositoryError::DataCorruption` if the blob is not a valid identity.
    pub async fn get_session(&self) -> Result<Option<CurrentUser>, RepositoryError> {
        let Some(raw) = self.storage.get_item(keys::SESSION).await? else {
            return Ok(None);
        };

        let user: CurrentUser = serde_json::from_str(&raw)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid session: {e}")))?;
        if user.email.is_empty() || user.id != user.email.as_str() {
            return Err(RepositoryError::DataCorruption(
                "session identity does not match its email".to_owned(),
            ));
        }

        Ok(Some(user))
    }

    /// Persist the current session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn set_session(&self, user: &CurrentUser) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(user).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize session: {e}"))
        })?;
        self.storage.set_item(keys::SESSION, &raw).await
    }

    /// Remove the persisted session. Removing a missing session is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear_session(&self) -> Result<(), RepositoryError> {
        self.storage.remove_item(keys::SESSION).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::Store;

    fn credential(password: &str, name: &str) -> StoredCredential {
        StoredCredential {
            password: password.to_owned(),
            name: name.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_credentials_roundtrip_through_storage() {
        let store = Store::in_memory().await.unwrap();
        let storage = store.local_storage();
        let users = UserRepository::new(&storage);
        let email = Email::normalize("ann@example.com");

        assert!(users.get_credentials().await.unwrap().is_empty());
        users.create(&email, credential("secret1", "Ann")).await.unwrap();

        let raw = storage.get_item(keys::USERS).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["ann@example.com"]["password"], "secret1");
        assert_eq!(value["ann@example.com"]["name"], "Ann");

        assert_eq!(
            users.get_by_email(&email).await.unwrap(),
            Some(credential("secret1", "Ann"))
        );
    }

    #[tokio::test]
    async fn test_stored_keys_are_normalized() {
        let store = Store::in_memory().await.unwrap();
        let storage = store.local_storage();
        storage
            .set_item(
                keys::USERS,
                r#"{
                    " Ann@Example.com": {"password": "secret1", "name": "Ann"},
                    "BOB@example.com": {"password": "old", "name": "Old Bob"},
                    "bob@example.com": {"password": "secret2", "name": "Bob"}
                }"#,
            )
            .await
            .unwrap();
        let users = UserRepository::new(&storage);

        assert_eq!(
            users.get_by_email(&Email::normalize("ann@example.com")).await.unwrap(),
            Some(credential("secret1", "Ann"))
        );
        assert_eq!(
            users.get_by_email(&Email::normalize("bob@example.com")).await.unwrap(),
            Some(credential("secret2", "Bob"))
        );
        assert_eq!(users.get_credentials().await.unwrap().len(), 2);

        let err = users
            .create(&Email::normalize("ANN@example.com"), credential("other1", "Ann 2"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_conflict_keeps_original() {
        let store = Store::in_memory().await.unwrap();
        let storage = store.local_storage();
        let users = UserRepository::new(&storage);
        let email = Email::normalize("ann@example.com");

        users.create(&email, credential("secret1", "Ann")).await.unwrap();
        let result = users.create(&email, credential("other1", "Impostor")).await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(
            users.get_by_email(&email).await.unwrap(),
            Some(credential("secret1", "Ann"))
        );
    }

    #[tokio::test]
    async fn test_corrupt_table_is_not_overwritten() {
        let store = Store::in_memory().await.unwrap();
        let storage = store.local_storage();
        storage.set_item(keys::USERS, "{broken").await.unwrap();
        let users = UserRepository::new(&storage);

        let result = users
            .create(&Email::normalize("bob@example.com"), credential("secret1", "Bob"))
            .await;
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
        assert_eq!(
            storage.get_item(keys::USERS).await.unwrap().as_deref(),
            Some("{broken")
        );
    }

    #[tokio::test]
    async fn test_session_blob_shape() {
        let store = Store::in_memory().await.unwrap();
        let storage = store.local_storage();
        let users = UserRepository::new(&storage);
        let user = CurrentUser::new(Email::normalize("ann@example.com"), "Ann");

        users.set_session(&user).await.unwrap();
        let raw = storage.get_item(keys::SESSION).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": "ann@example.com", "email": "ann@example.com", "name": "Ann"})
        );
        assert_eq!(users.get_session().await.unwrap(), Some(user));

        users.clear_session().await.unwrap();
        users.clear_session().await.unwrap();
        assert_eq!(users.get_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_mismatched_session_is_corrupt() {
        let store = Store::in_memory().await.unwrap();
        let storage = store.local_storage();
        storage
            .set_item(
                keys::SESSION,
                r#"{"id": "someone@else.com", "email": "ann@example.com", "name": "Ann"}"#,
            )
            .await
            .unwrap();

        assert!(matches!(
            UserRepository::new(&storage).get_session().await,
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}

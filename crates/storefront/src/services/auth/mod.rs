//! Credential and session management.
//!
//! Accounts live in a local credential table; the logged-in identity is
//! persisted next to it so that it survives a restart. Both are blobs in
//! [`LocalStorage`] and are independent of the store's versioned schema.
//!
//! Passwords are compared as stored, with no hashing. Nothing leaves the
//! client.

mod error;

pub use error::AuthError;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use magasin_core::Email;

use crate::db::{LocalStorage, RepositoryError, UserRepository};
use crate::models::{CurrentUser, StoredCredential};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication status of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Boot-time: the persisted session has not been read yet, so absence
    /// of a user means nothing.
    Loading,
    /// No one is logged in.
    Unauthenticated,
    /// A user is logged in.
    Authenticated(CurrentUser),
}

/// Session manager.
///
/// Starts in [`AuthState::Loading`]; call [`SessionManager::rehydrate`]
/// once at boot.
#[derive(Debug)]
pub struct SessionManager {
    storage: LocalStorage,
    state: AuthState,
}

impl SessionManager {
    /// Create a session manager over `storage`.
    #[must_use]
    pub const fn new(storage: LocalStorage) -> Self {
        Self {
            storage,
            state: AuthState::Loading,
        }
    }

    /// Create a session manager and rehydrate it.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::rehydrate`]. The manager is unusable only in
    /// the sense that the read failed; callers that want a manager anyway
    /// should use [`SessionManager::new`] and ignore the rehydrate error.
    pub async fn boot(storage: LocalStorage) -> Result<Self, AuthError> {
        let mut manager = Self::new(storage);
        manager.rehydrate().await?;
        Ok(manager)
    }

    /// Current authentication status.
    #[must_use]
    pub const fn state(&self) -> &AuthState {
        &self.state
    }

    /// The logged-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&CurrentUser> {
        match &self.state {
            AuthState::Authenticated(user) => Some(user),
            AuthState::Loading | AuthState::Unauthenticated => None,
        }
    }

    /// `true` until rehydration has finished.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, AuthState::Loading)
    }

    /// `true` while a user is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated(_))
    }

    const fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.storage)
    }

    /// Restore the persisted session.
    ///
    /// Always leaves the loading state. A corrupt session blob is deleted
    /// and the client starts logged out.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if local storage cannot be read. The
    /// manager is then `Unauthenticated`.
    #[instrument(skip(self))]
    pub async fn rehydrate(&mut self) -> Result<(), AuthError> {
        self.state = AuthState::Unauthenticated;

        match self.users().get_session().await {
            Ok(Some(user)) => {
                info!(email = %user.email, "Session restored");
                self.state = AuthState::Authenticated(user);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(RepositoryError::DataCorruption(reason)) => {
                warn!(%reason, "Discarding corrupt session");
                self.users().clear_session().await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Log in with email and password.
    ///
    /// The email is normalized first. On success the session replaces any
    /// previous one and is persisted.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountNotFound` if no credential matches the email.
    /// Returns `AuthError::InvalidPassword` if the password differs.
    /// Returns `AuthError::Repository` if local storage fails.
    #[instrument(skip(self, password), fields(email = %Email::normalize(email)))]
    pub async fn login(
        &mut self,
        email: &str,
        password: &SecretString,
    ) -> Result<CurrentUser, AuthError> {
        let email = Email::normalize(email);

        let credential = match self.users().get_by_email(&email).await {
            Ok(credential) => credential,
            Err(RepositoryError::DataCorruption(reason)) => {
                warn!(%reason, "Credential table unreadable, treating it as empty");
                None
            }
            Err(e) => return Err(e.into()),
        }
        .ok_or(AuthError::AccountNotFound)?;

        if credential.password != password.expose_secret() {
            return Err(AuthError::InvalidPassword);
        }

        let user = CurrentUser::new(email, credential.name);
        self.establish(user).await
    }

    /// Create an account and log into it.
    ///
    /// The email is normalized and the name trimmed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailTaken` if the email already has an account.
    /// Returns `AuthError::PasswordTooShort` if the password has fewer than
    /// [`MIN_PASSWORD_LENGTH`] characters.
    /// Returns `AuthError::Repository` if local storage fails or the credential
    /// table is unreadable (it is never overwritten).
    #[instrument(skip(self, password, name), fields(email = %Email::normalize(email)))]
    pub async fn signup(
        &mut self,
        email: &str,
        password: &SecretString,
        name: &str,
    ) -> Result<CurrentUser, AuthError> {
        let email = Email::normalize(email);

        if self.users().get_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        validate_password(password)?;

        let name = name.trim();
        let credential = StoredCredential {
            password: password.expose_secret().to_owned(),
            name: name.to_owned(),
        };
        self.users()
            .create(&email, credential)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;
        info!("Account created");

        self.establish(CurrentUser::new(email, name)).await
    }

    /// Log out. Logging out with no session is not an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the persisted session cannot be
    /// deleted. The in-memory session is gone either way.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) -> Result<(), AuthError> {
        if let AuthState::Authenticated(user) = &self.state {
            info!(email = %user.email, "Logged out");
        }
        self.state = AuthState::Unauthenticated;
        self.users().clear_session().await?;
        Ok(())
    }

    async fn establish(&mut self, user: CurrentUser) -> Result<CurrentUser, AuthError> {
        self.users().set_session(&user).await?;
        info!(email = %user.email, "Session established");
        self.state = AuthState::Authenticated(user.clone());
        Ok(user)
    }
}

/// Validate password requirements. Length is counted in UTF-16 code units.
fn validate_password(password: &SecretString) -> Result<(), AuthError> {
    if password.expose_secret().encode_utf16().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::PasswordTooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::models::session::keys;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    async fn manager() -> (Store, SessionManager) {
        let store = Store::in_memory().await.unwrap();
        let manager = SessionManager::boot(store.local_storage()).await.unwrap();
        (store, manager)
    }

    #[tokio::test]
    async fn test_starts_loading_until_rehydrated() {
        let store = Store::in_memory().await.unwrap();
        let mut manager = SessionManager::new(store.local_storage());
        assert!(manager.is_loading());
        assert_eq!(manager.user(), None);

        manager.rehydrate().await.unwrap();
        assert!(!manager.is_loading());
        assert_eq!(manager.state(), &AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_signup_then_login_with_other_case_and_whitespace() {
        let (_store, mut manager) = manager().await;

        let created = manager
            .signup("A@Example.com", &secret("secret1"), "Ann")
            .await
            .unwrap();
        manager.logout().await.unwrap();

        let user = manager
            .login("a@example.com ", &secret("secret1"))
            .await
            .unwrap();

        let expected = CurrentUser {
            id: "a@example.com".to_owned(),
            email: Email::normalize("a@example.com"),
            name: "Ann".to_owned(),
        };
        assert_eq!(created, expected);
        assert_eq!(user, expected);
        assert_eq!(manager.user(), Some(&expected));
    }

    #[tokio::test]
    async fn test_login_distinguishes_unknown_account_and_wrong_password() {
        let (_store, mut manager) = manager().await;
        manager
            .signup("ann@example.com", &secret("secret1"), "Ann")
            .await
            .unwrap();
        manager.logout().await.unwrap();

        let unknown = manager
            .login("bob@example.com", &secret("secret1"))
            .await
            .unwrap_err();
        assert!(matches!(unknown, AuthError::AccountNotFound));
        assert_eq!(unknown.to_string(), "No account found with this email");

        let wrong = manager
            .login("ann@example.com", &secret("Secret1"))
            .await
            .unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidPassword));
        assert_eq!(wrong.to_string(), "Incorrect password");
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_duplicate_signup_rejected_and_original_kept() {
        let (store, mut manager) = manager().await;
        manager
            .signup("ann@example.com", &secret("secret1"), "Ann")
            .await
            .unwrap();

        let err = manager
            .signup("  ANN@example.COM", &secret("another1"), "Impostor")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));

        let storage = store.local_storage();
        let credential = UserRepository::new(&storage)
            .get_by_email(&Email::normalize("ann@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credential.name, "Ann");
        assert_eq!(credential.password, "secret1");
    }

    #[tokio::test]
    async fn test_duplicate_checked_before_password_length() {
        let (_store, mut manager) = manager().await;
        manager
            .signup("ann@example.com", &secret("secret1"), "Ann")
            .await
            .unwrap();

        let err = manager
            .signup("ann@example.com", &secret("abc"), "Ann")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_short_password_rejected_without_state_change() {
        let (store, mut manager) = manager().await;

        let err = manager
            .signup("ann@example.com", &secret("12345"), "Ann")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordTooShort { min: 6 }));
        assert_eq!(err.to_string(), "Password must be at least 6 characters");
        assert!(!manager.is_authenticated());

        let storage = store.local_storage();
        assert!(UserRepository::new(&storage)
            .get_credentials()
            .await
            .unwrap()
            .is_empty());
        assert_eq!(storage.get_item(keys::SESSION).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_signup_trims_name() {
        let (_store, mut manager) = manager().await;
        let user = manager
            .signup("ann@example.com", &secret("secret1"), "  Ann Lee ")
            .await
            .unwrap();
        assert_eq!(user.name, "Ann Lee");
    }

    #[tokio::test]
    async fn test_session_survives_restart() {
        let (store, mut manager) = manager().await;
        let user = manager
            .signup("ann@example.com", &secret("secret1"), "Ann")
            .await
            .unwrap();

        let restarted = SessionManager::boot(store.local_storage()).await.unwrap();
        assert_eq!(restarted.user(), Some(&user));
    }

    #[tokio::test]
    async fn test_login_replaces_previous_session() {
        let (store, mut manager) = manager().await;
        manager
            .signup("ann@example.com", &secret("secret1"), "Ann")
            .await
            .unwrap();
        let bob = manager
            .signup("bob@example.com", &secret("secret2"), "Bob")
            .await
            .unwrap();
        assert_eq!(manager.user(), Some(&bob));

        let ann = manager
            .login("ann@example.com", &secret("secret1"))
            .await
            .unwrap();
        assert_eq!(manager.user(), Some(&ann));

        let restarted = SessionManager::boot(store.local_storage()).await.unwrap();
        assert_eq!(restarted.user(), Some(&ann));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent_and_clears_persisted_session() {
        let (store, mut manager) = manager().await;
        manager.logout().await.unwrap();

        manager
            .signup("ann@example.com", &secret("secret1"), "Ann")
            .await
            .unwrap();
        manager.logout().await.unwrap();
        manager.logout().await.unwrap();

        assert_eq!(manager.state(), &AuthState::Unauthenticated);
        let restarted = SessionManager::boot(store.local_storage()).await.unwrap();
        assert_eq!(restarted.user(), None);
    }

    #[tokio::test]
    async fn test_corrupt_session_is_discarded_at_boot() {
        let store = Store::in_memory().await.unwrap();
        let storage = store.local_storage();
        storage.set_item(keys::SESSION, "{not json").await.unwrap();

        let manager = SessionManager::boot(store.local_storage()).await.unwrap();
        assert_eq!(manager.state(), &AuthState::Unauthenticated);
        assert_eq!(storage.get_item(keys::SESSION).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_wrong_shape_session_is_discarded_at_boot() {
        let store = Store::in_memory().await.unwrap();
        let storage = store.local_storage();
        storage
            .set_item(keys::SESSION, r#"{"user": 42}"#)
            .await
            .unwrap();

        let manager = SessionManager::boot(store.local_storage()).await.unwrap();
        assert_eq!(manager.state(), &AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_corrupt_credentials_login_reports_no_account() {
        let (store, mut manager) = manager().await;
        store
            .local_storage()
            .set_item(keys::USERS, "[1, 2")
            .await
            .unwrap();

        let err = manager
            .login("ann@example.com", &secret("secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountNotFound));

        let err = manager
            .signup("ann@example.com", &secret("secret1"), "Ann")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::Repository(RepositoryError::DataCorruption(_))
        ));
    }

    #[tokio::test]
    async fn test_password_length_counts_utf16_units() {
        let (_store, mut manager) = manager().await;

        // Three astral characters are six UTF-16 units.
        manager
            .signup("emoji@example.com", &secret("\u{1F600}\u{1F600}\u{1F600}"), "Emoji")
            .await
            .unwrap();
        manager.logout().await.unwrap();

        assert!(matches!(
            manager.signup("short@example.com", &secret("12345"), "Short").await,
            Err(AuthError::PasswordTooShort { min: 6 })
        ));
        assert!(matches!(
            manager.signup("e2@example.com", &secret("\u{1F600}\u{1F600}a"), "E2").await,
            Err(AuthError::PasswordTooShort { .. })
        ));
    }
}

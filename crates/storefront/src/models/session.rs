//! Session-related types.
//!
//! Types persisted in local storage for authentication state.

use serde::{Deserialize, Serialize};

use magasin_core::Email;

/// Session-stored user identity.
///
/// Minimal data persisted to identify the logged-in user across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User ID (the normalized email).
    pub id: String,
    /// User's normalized email address.
    pub email: Email,
    /// Display name.
    pub name: String,
}

impl CurrentUser {
    /// Build the identity for a normalized email.
    #[must_use]
    pub fn new(email: Email, name: impl Into<String>) -> Self {
        Self {
            id: email.as_str().to_owned(),
            email,
            name: name.into(),
        }
    }
}

/// One entry of the credential table, keyed by normalized email.
///
/// The password is stored as entered. Local storage is the only place it
/// ever lives.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub password: String,
    pub name: String,
}

impl std::fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredCredential")
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

/// Local storage keys for authentication data.
pub mod keys {
    /// Key for the credential table (normalized email → credential).
    pub const USERS: &str = "magasin_users";

    /// Key for the current logged-in user.
    pub const SESSION: &str = "magasin_session";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_hides_password() {
        let credential = StoredCredential {
            password: "hunter22".to_owned(),
            name: "Ann".to_owned(),
        };
        let debug = format!("{credential:?}");
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("Ann"));

        let table = std::collections::BTreeMap::from([("ann@example.com", credential)]);
        assert!(!format!("{table:?}").contains("hunter22"));
    }
}

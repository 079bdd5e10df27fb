//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
///
/// The display strings are shown to the user as-is. Unknown account and
/// wrong password are reported separately on purpose.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential exists for the email.
    #[error("No account found with this email")]
    AccountNotFound,

    /// The credential exists but the password differs.
    #[error("Incorrect password")]
    InvalidPassword,

    /// Signup for an email that already has a credential.
    #[error("An account with this email already exists")]
    EmailTaken,

    /// Signup password below the minimum length.
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum number of characters.
        min: usize,
    },

    /// Repository/storage error.
    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),
}

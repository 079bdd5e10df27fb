//! Unified error handling.
//!
//! Provides a unified `AppError` type for front ends that drive several
//! services and need one error to branch on and one message to show.

use thiserror::Error;

use crate::config::ConfigError;
use crate::db::RepositoryError;
use crate::db::seed::SeedError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;

const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The seed feed could not be loaded.
    #[error("Seed error: {0}")]
    Seed(#[from] SeedError),

    /// Store operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Whether the error comes from the storage layer rather than from
    /// user input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Database(
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) | RepositoryError::Conflict(_)
            ) | Self::Auth(AuthError::Repository(_))
                | Self::Cart(CartError::Repository(_))
                | Self::Checkout(CheckoutError::Repository(_) | CheckoutError::Cart(CartError::Repository(_)))
        )
    }

    /// Message safe to show to the user.
    ///
    /// Validation and authentication messages are shown as they are.
    /// Storage details are never exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        // Don't expose internal error details to users
        if self.is_internal() {
            return GENERIC_MESSAGE.to_owned();
        }

        match self {
            Self::Config(err) => err.to_string(),
            Self::Seed(err) => err.to_string(),
            Self::Database(err) => repository_message(err),
            Self::Auth(err) => err.to_string(),
            Self::Cart(err) | Self::Checkout(CheckoutError::Cart(err)) => cart_message(err),
            Self::Checkout(err) => err.to_string(),
            Self::NotFound(what) => format!("{what} not found"),
        }
    }
}

fn repository_message(err: &RepositoryError) -> String {
    match err {
        RepositoryError::NotFound => "Not found".to_owned(),
        RepositoryError::InvalidTransition(transition) => transition.to_string(),
        _ => GENERIC_MESSAGE.to_owned(),
    }
}

fn cart_message(err: &CartError) -> String {
    match err {
        CartError::ProductNotFound(_) => "This product is no longer available".to_owned(),
        CartError::EntryNotFound(_) => "This item is no longer in your cart".to_owned(),
        CartError::QuantityTooLarge { .. } => err.to_string(),
        CartError::Overflow(_) => "Your cart total is too large".to_owned(),
        CartError::Repository(_) => GENERIC_MESSAGE.to_owned(),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

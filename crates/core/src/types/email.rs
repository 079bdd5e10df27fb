//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A normalized email address.
///
/// Normalization lower-cases and trims the input so that `" A@Example.com"`
/// and `"a@example.com"` identify the same account. No format validation is
/// performed: shape checks belong to whoever collects the address.
///
/// ## Examples
///
/// ```
/// use magasin_core::Email;
///
/// let email = Email::normalize("  Ann@Example.COM ");
/// assert_eq!(email.as_str(), "ann@example.com");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Normalize an email address (trim surrounding whitespace, lower-case).
    #[must_use]
    pub fn normalize(s: &str) -> Self {
        Self(s.trim().to_lowercase())
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns `true` if nothing is left after normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Email {
    fn from(s: &str) -> Self {
        Self::normalize(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//! Catalog product.

use serde::{Deserialize, Serialize};

use magasin_core::{Price, ProductId};

/// A catalog product.
///
/// Products are created once by the seed feed; the `id` comes from the feed,
/// not from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Feed-assigned product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Price,
    /// Category used by the category filter.
    pub category: String,
    /// Image URI.
    pub image: String,
    /// Long description.
    pub description: String,
}

impl Product {
    /// Case-insensitive substring match against name and description.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }
}

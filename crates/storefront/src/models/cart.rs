//! Persisted cart row.

use serde::{Deserialize, Serialize};

use magasin_core::{CartEntryId, ProductId};

/// One row of the persisted `cart` collection.
///
/// The store allows several rows per product; the cart aggregator is what
/// keeps it to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Store-assigned surrogate key.
    pub id: CartEntryId,
    /// Product this row refers to.
    pub product_id: ProductId,
    /// Number of units.
    pub quantity: u32,
}

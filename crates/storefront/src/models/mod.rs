//! Domain models for the storefront core.
//!
//! These types are the validated records handed out by the store and the
//! services. Database row types stay private to [`crate::db`].

pub mod cart;
pub mod order;
pub mod product;
pub mod session;

pub use cart::CartEntry;
pub use order::{NewOrder, Order, OrderItem, ShippingAddress};
pub use product::Product;
pub use session::{CurrentUser, StoredCredential};

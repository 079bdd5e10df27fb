//! Business logic services for the storefront core.
//!
//! # Services
//!
//! - `auth` - Credential table and session ([`SessionManager`])
//! - `cart` - In-memory cart view over the persisted cart ([`CartAggregator`])
//! - `checkout` - Turning a cart into an order ([`place_order`])

pub mod auth;
pub mod cart;
pub mod checkout;

pub use auth::{AuthError, AuthState, SessionManager};
pub use cart::{CartAggregator, CartError, CartItem};
pub use checkout::{CheckoutError, CheckoutForm, place_order};

//! Magasin Core - Shared types library.
//!
//! This crate provides common types used across all Magasin components:
//! - `storefront` - Local persistence, session and cart core
//! - `cli` - Command-line driver for the storefront core
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

//! Magasin storefront core.
//!
//! The local persistence and session layer behind a storefront client:
//!
//! - [`db`] - the versioned local store and its collections
//! - [`services::auth`] - credential table and current session
//! - [`services::cart`] - the in-memory cart view and its totals
//! - [`services::checkout`] - turning a cart into an order
//!
//! Nothing here talks to a network; every piece of state lives in one
//! `SQLite` database owned by the running client.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

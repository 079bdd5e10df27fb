//! Seed product feed.
//!
//! The built-in catalog ships inside the binary. A JSON file with the same
//! shape can replace it (see `MAGASIN_SEED_FILE`).

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use crate::models::Product;

const BUILTIN_CATALOG: &str = include_str!("../../data/products.json");

/// Errors that can occur while loading a seed feed.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid seed feed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate product id {0} in seed feed")]
    DuplicateId(magasin_core::ProductId),
}

/// The built-in catalog.
///
/// # Errors
///
/// Returns `SeedError::Parse` if the embedded feed is malformed.
pub fn catalog() -> Result<Vec<Product>, SeedError> {
    parse(BUILTIN_CATALOG)
}

/// Load a catalog from a JSON file.
///
/// # Errors
///
/// Returns `SeedError::Io` if the file cannot be read, `SeedError::Parse` if
/// it is not a product list, and `SeedError::DuplicateId` if two products
/// share an id.
pub async fn from_file(path: &Path) -> Result<Vec<Product>, SeedError> {
    let content = tokio::fs::read_to_string(path).await?;
    parse(&content)
}

fn parse(json: &str) -> Result<Vec<Product>, SeedError> {
    let products: Vec<Product> = serde_json::from_str(json)?;

    let mut seen = HashSet::with_capacity(products.len());
    if let Some(dup) = products.iter().find(|p| !seen.insert(p.id)) {
        return Err(SeedError::DuplicateId(dup.id));
    }

    Ok(products)
}

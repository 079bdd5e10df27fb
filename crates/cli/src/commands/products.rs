//! Catalog commands.

use magasin_core::{Price, ProductId};
use magasin_storefront::db::RepositoryError;
use magasin_storefront::error::AppError;
use magasin_storefront::models::Product;

use super::Context;

/// List products, filtered by category and search text.
///
/// # Errors
///
/// Returns `AppError::Database` if the catalog cannot be read.
pub async fn list(
    ctx: &Context,
    category: Option<&str>,
    search: Option<&str>,
) -> Result<(), AppError> {
    let products = ctx.store.products();
    let found = match (category, search) {
        (Some(category), query) => {
            let mut found = products.get_by_category(category).await?;
            if let Some(query) = query {
                found.retain(|product| product.matches(query));
            }
            found
        }
        (None, Some(query)) => products.search(query).await?,
        (None, None) => products.get_all().await?,
    };

    if found.is_empty() {
        println!("No products found");
    }
    for product in &found {
        println!("{}", format_product(product));
    }
    Ok(())
}

/// List categories.
///
/// # Errors
///
/// Returns `AppError::Database` if the catalog cannot be read.
pub async fn categories(ctx: &Context) -> Result<(), AppError> {
    for category in ctx.store.products().categories().await? {
        println!("{category}");
    }
    Ok(())
}

/// Change a product's price.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the product doesn't exist.
pub async fn set_price(ctx: &Context, id: ProductId, price: Price) -> Result<(), AppError> {
    ctx.store
        .products()
        .update_price(id, price)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("Product {id}")),
            other => other.into(),
        })?;
    println!("Product {id} now costs {price}");
    Ok(())
}

fn format_product(product: &Product) -> String {
    format!(
        "#{:<4} {:<32} {:>10}  {}",
        product.id,
        product.name,
        product.price.to_string(),
        product.category
    )
}

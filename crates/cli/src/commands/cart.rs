//! Cart commands.

use magasin_core::{CartEntryId, ProductId};
use magasin_storefront::error::AppError;
use magasin_storefront::services::CartError;

use super::Context;

/// Print the cart lines and totals.
///
/// # Errors
///
/// Returns `AppError::Cart` if a line or the total overflows.
pub fn show(ctx: &Context) -> Result<(), AppError> {
    let cart = &ctx.cart;
    if cart.is_empty() {
        println!("Your cart is empty");
        return Ok(());
    }

    let total = cart.total_price()?;
    for item in cart.items() {
        println!(
            "[{:<3}] {:<32} {:>3} x {:>9} = {:>10}",
            item.entry_id,
            item.product.name,
            item.quantity,
            item.product.price.to_string(),
            item.line_total().map_err(CartError::from)?.to_string()
        );
    }
    println!("{} item(s), total {total}", cart.total_items());
    Ok(())
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the product doesn't exist.
pub async fn add(ctx: &mut Context, product_id: ProductId) -> Result<(), AppError> {
    let product = ctx
        .store
        .products()
        .get_by_id(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {product_id}")))?;

    ctx.cart.add_to_cart(&product).await?;
    println!("Added {} to your cart", product.name);
    show(ctx)
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns `AppError::Cart` if the line doesn't exist.
pub async fn set(ctx: &mut Context, entry_id: CartEntryId, quantity: i64) -> Result<(), AppError> {
    ctx.cart.update_quantity(entry_id, quantity).await?;
    show(ctx)
}

/// Remove a line.
///
/// # Errors
///
/// Returns `AppError::Cart` if the line doesn't exist.
pub async fn remove(ctx: &mut Context, entry_id: CartEntryId) -> Result<(), AppError> {
    ctx.cart.remove_from_cart(entry_id).await?;
    show(ctx)
}

/// Empty the cart.
///
/// # Errors
///
/// Returns `AppError::Cart` if the cart cannot be cleared.
pub async fn clear(ctx: &mut Context) -> Result<(), AppError> {
    ctx.cart.clear_cart().await?;
    println!("Cart cleared");
    Ok(())
}

//! Checkout and order commands.

use magasin_core::{OrderId, OrderStatus};
use magasin_storefront::db::RepositoryError;
use magasin_storefront::error::AppError;
use magasin_storefront::models::{Order, ShippingAddress};
use magasin_storefront::services::{CheckoutForm, place_order};

use super::Context;
use crate::CheckoutArgs;

/// Place an order for the whole cart.
///
/// # Errors
///
/// Returns `AppError::Checkout` if the cart is empty or required fields
/// are blank.
pub async fn checkout(ctx: &mut Context, args: CheckoutArgs) -> Result<(), AppError> {
    let email = args
        .email
        .or_else(|| ctx.session.user().map(|user| user.email.to_string()))
        .unwrap_or_default();

    let form = CheckoutForm {
        shipping: ShippingAddress {
            first_name: args.first_name,
            last_name: args.last_name,
            email,
            phone: args.phone.filter(|phone| !phone.trim().is_empty()),
            address: args.address,
            city: args.city,
            postal_code: args.postal_code,
            country: args.country,
        },
        payment_method: args.payment,
    };

    let order_id = place_order(&ctx.store, &mut ctx.cart, form).await?;
    println!("Order #{order_id} placed");
    show(ctx, order_id).await
}

/// List orders, most recent first.
///
/// # Errors
///
/// Returns `AppError::Database` if the orders cannot be read.
pub async fn list(ctx: &Context) -> Result<(), AppError> {
    let orders = ctx.store.orders().get_all().await?;
    if orders.is_empty() {
        println!("No orders yet");
    }
    for order in &orders {
        println!(
            "#{:<4} {}  {:<10} {:>3} item(s) {:>10}",
            order.id,
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.status.as_str(),
            order.item_count(),
            order.total_price.to_string()
        );
    }
    Ok(())
}

/// Show one order.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the order doesn't exist.
pub async fn show(ctx: &Context, id: OrderId) -> Result<(), AppError> {
    let order = ctx
        .store
        .orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {id}")))?;
    print_order(&order);
    Ok(())
}

/// Move an order to a new status.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the order doesn't exist, or
/// `AppError::Database` if the status change is not allowed.
pub async fn set_status(ctx: &Context, id: OrderId, status: OrderStatus) -> Result<(), AppError> {
    let order = ctx
        .store
        .orders()
        .update_status(id, status)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("Order {id}")),
            other => other.into(),
        })?;
    println!("Order #{} is now {}", order.id, order.status);
    Ok(())
}

fn print_order(order: &Order) {
    let ship = &order.shipping_address;
    println!("Order #{} ({})", order.id, order.status);
    println!("  placed   {}", order.created_at.to_rfc3339());
    println!("  updated  {}", order.updated_at.to_rfc3339());
    println!(
        "  ship to  {} {}, {}, {} {}, {}",
        ship.first_name, ship.last_name, ship.address, ship.postal_code, ship.city, ship.country
    );
    println!("  payment  {}", order.payment_method);
    for item in &order.items {
        println!(
            "  {:>3} x {:<32} {:>10}",
            item.quantity,
            item.name,
            item.line_total().map_or_else(|_| "overflow".to_owned(), |total| total.to_string())
        );
    }
    println!("  total    {}", order.total_price);
}

//! Magasin CLI - drive the storefront core from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Seed the catalog and show what happened
//! magasin init
//!
//! # Browse
//! magasin products list --category Home
//! magasin products list --search linen
//!
//! # Account
//! magasin signup ann@example.com secret1 "Ann Lee"
//! magasin whoami
//!
//! # Cart and checkout
//! magasin cart add 3
//! magasin cart set 1 4
//! magasin checkout --first-name Ann --last-name Lee --address "1 Rue de la Paix" \
//!     --city Paris --postal-code 75002 --country France --payment card
//!
//! # Orders
//! magasin orders list
//! magasin orders status 1 processing
//! ```
//!
//! Every command boots the store first: the schema is migrated, the catalog
//! is seeded if empty, the session is restored and the cart is loaded.
//! Logs go to stderr (`RUST_LOG` overrides the default filter).

#![cfg_attr(not(test), forbid(unsafe_code))]
// Command output is the point of a CLI
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use magasin_core::{CartEntryId, OrderId, OrderStatus, PaymentMethod, Price, ProductId};
use magasin_storefront::config::StorefrontConfig;
use magasin_storefront::error::AppError;

mod commands;

use commands::Context;

const DEFAULT_LOG_FILTER: &str = "magasin_storefront=info,magasin_cli=info";

#[derive(Parser)]
#[command(name = "magasin")]
#[command(author, version, about = "Magasin storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the store and seed the catalog if it is empty
    Init,
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Create an account and log into it
    Signup {
        email: String,
        password: String,
        name: String,
    },
    /// Log in
    Login { email: String, password: String },
    /// Log out
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the whole cart
    Checkout(CheckoutArgs),
    /// Inspect and advance orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products, optionally filtered
    List {
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,

        /// Case-insensitive match on name and description
        #[arg(short, long)]
        search: Option<String>,
    },
    /// List categories
    Categories,
    /// Change a product's catalog price
    SetPrice { id: ProductId, price: Price },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart and its totals
    Show,
    /// Add one unit of a product
    Add { product_id: ProductId },
    /// Set a line's quantity (0 or less removes it)
    Set {
        entry_id: CartEntryId,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { entry_id: CartEntryId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, most recent first
    List,
    /// Show one order
    Show { id: OrderId },
    /// Move an order to a new status
    Status { id: OrderId, status: OrderStatus },
}

/// Shipping form. Blank required fields are reported together.
#[derive(Args)]
pub struct CheckoutArgs {
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
    /// Defaults to the logged-in user's email
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    postal_code: String,
    #[arg(long, default_value = "")]
    country: String,
    #[arg(long, default_value_t = PaymentMethod::Card)]
    payment: PaymentMethod,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = StorefrontConfig::from_env()?;
    let mut ctx = Context::boot(&config).await?;

    match cli.command {
        Commands::Init => commands::init(&ctx).await?,
        Commands::Products { action } => match action {
            ProductsAction::List { category, search } => {
                commands::products::list(&ctx, category.as_deref(), search.as_deref()).await?;
            }
            ProductsAction::Categories => commands::products::categories(&ctx).await?,
            ProductsAction::SetPrice { id, price } => {
                commands::products::set_price(&ctx, id, price).await?;
            }
        },
        Commands::Signup {
            email,
            password,
            name,
        } => commands::account::signup(&mut ctx, &email, password, &name).await?,
        Commands::Login { email, password } => {
            commands::account::login(&mut ctx, &email, password).await?;
        }
        Commands::Logout => commands::account::logout(&mut ctx).await?,
        Commands::Whoami => commands::account::whoami(&ctx),
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx)?,
            CartAction::Add { product_id } => commands::cart::add(&mut ctx, product_id).await?,
            CartAction::Set { entry_id, quantity } => {
                commands::cart::set(&mut ctx, entry_id, quantity).await?;
            }
            CartAction::Remove { entry_id } => commands::cart::remove(&mut ctx, entry_id).await?,
            CartAction::Clear => commands::cart::clear(&mut ctx).await?,
        },
        Commands::Checkout(args) => commands::orders::checkout(&mut ctx, args).await?,
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&ctx).await?,
            OrdersAction::Show { id } => commands::orders::show(&ctx, id).await?,
            OrdersAction::Status { id, status } => {
                commands::orders::set_status(&ctx, id, status).await?;
            }
        },
    }

    Ok(())
}

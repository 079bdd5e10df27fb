//! Command implementations.
//!
//! Every command runs against a booted [`Context`].

pub mod account;
pub mod cart;
pub mod orders;
pub mod products;

use tracing::info;

use magasin_storefront::config::StorefrontConfig;
use magasin_storefront::db::{SeedOutcome, Store};
use magasin_storefront::error::AppError;
use magasin_storefront::services::{CartAggregator, SessionManager};

/// The booted client: store, session and cart.
pub struct Context {
    pub store: Store,
    pub session: SessionManager,
    pub cart: CartAggregator,
    pub seed: SeedOutcome,
}

impl Context {
    /// Open the store, seed it if empty, restore the session and load the
    /// cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError` if the store cannot be opened or read, or the seed
    /// feed cannot be loaded.
    pub async fn boot(config: &StorefrontConfig) -> Result<Self, AppError> {
        let store = Store::open(&config.database_url, config.max_connections).await?;

        let catalog = config.load_catalog().await?;
        let seed = store.initialize(&catalog).await?;

        let mut session = SessionManager::new(store.local_storage());
        session.rehydrate().await?;

        let cart = CartAggregator::load(store.clone()).await?;

        info!(database_url = %config.database_url, "Storefront ready");
        Ok(Self {
            store,
            session,
            cart,
            seed,
        })
    }
}

/// Report what boot did to the catalog.
///
/// # Errors
///
/// Returns `AppError::Database` if the catalog cannot be counted.
pub async fn init(ctx: &Context) -> Result<(), AppError> {
    match ctx.seed {
        SeedOutcome::Seeded { inserted } => println!("Seeded {inserted} products"),
        SeedOutcome::AlreadySeeded { .. } => {
            let count = ctx.store.products().count().await?;
            println!("Catalog already holds {count} products");
        }
    }
    Ok(())
}

//! Database operations for the shop `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `users`, `user_profiles` - local mirror of identity-provider users
//! - `addresses` - shipping addresses, at most one default per user
//! - `categories` - self-referencing category hierarchy
//! - `products`
//! - `carts`, `cart_items` - at most one active cart per user
//! - `orders`, `order_items` - immutable checkout snapshots
//!
//! Migrations live in `migrations/` and are embedded into the binary.

use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;
use crate::ShopError;

pub mod addresses;
pub mod carts;
pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

pub use addresses::{AddressRepository, AddressWrite};
pub use carts::CartRepository;
pub use categories::{CategoryDraft, CategoryRepository};
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await
}

/// Maps the foreign-key failure of a write keyed on an unknown user to `Unauthorized`.
pub(crate) fn unregistered_user(err: sqlx::Error, user_id: uuid::Uuid) -> ShopError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            ShopError::Unauthorized(format!("user {user_id} is not registered"))
        }
        other => other.into(),
    }
}

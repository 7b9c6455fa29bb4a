//! Cart repository.
//!
//! The single-active-cart rule is enforced by the partial unique index
//! `carts_one_active_per_user`; creation goes through `ON CONFLICT DO NOTHING`
//! so two racing requests end up sharing one cart. Quantity merges are a
//! single upsert, never a read followed by a write, and run while the cart row
//! is share-locked so a concurrent checkout cannot retire the cart under them.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::aggregates::{Cart, CartContents, CartItem, Product};
use crate::domain::value_objects::Quantity;
use crate::{Result, ShopError};

use super::unregistered_user;

const ACTIVE_CART_ATTEMPTS: usize = 3;
/// SQLSTATE `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Returns the user's active cart, creating it on first use.
    pub async fn active_cart(&self, user_id: Uuid) -> Result<Cart> {
        for _ in 0..ACTIVE_CART_ATTEMPTS {
            let created = sqlx::query_as::<_, Cart>(
                "INSERT INTO carts (id, user_id) VALUES ($1, $2) \
                 ON CONFLICT (user_id) WHERE is_active DO NOTHING RETURNING *",
            )
            .bind(Uuid::now_v7())
            .bind(user_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| unregistered_user(e, user_id))?;
            if let Some(cart) = created {
                tracing::info!(cart_id = %cart.id, %user_id, "cart created");
                return Ok(cart);
            }

            let existing = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = $1 AND is_active")
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;
            // None means a checkout retired the cart between the two statements
            if let Some(cart) = existing {
                return Ok(cart);
            }
        }
        Err(ShopError::Conflict(format!("could not settle an active cart for user {user_id}")))
    }

    /// The user's active cart with live product prices.
    pub async fn contents(&self, user_id: Uuid) -> Result<CartContents> {
        let cart = self.active_cart(user_id).await?;
        let mut conn = self.pool.acquire().await?;
        load_contents(&mut conn, cart, false).await
    }

    /// Adds `quantity` of a product, merging with an existing line by summing quantities.
    pub async fn add_item(&self, user_id: Uuid, product_id: Uuid, quantity: Quantity) -> Result<CartItem> {
        let product_exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
            .bind(product_id)
            .fetch_one(self.pool)
            .await?;
        if !product_exists {
            return Err(ShopError::not_found(format!("product {product_id}")));
        }

        for _ in 0..ACTIVE_CART_ATTEMPTS {
            let cart = self.active_cart(user_id).await?;
            let mut tx = self.pool.begin().await?;
            // blocks behind a checkout holding the cart; afterwards the row no longer matches
            let still_active: Option<Uuid> = sqlx::query_scalar("SELECT id FROM carts WHERE id = $1 AND is_active FOR SHARE")
                .bind(cart.id)
                .fetch_optional(&mut *tx)
                .await?;
            if still_active.is_none() {
                tracing::debug!(cart_id = %cart.id, %user_id, "cart retired while adding an item, retrying");
                continue;
            }

            let item = sqlx::query_as::<_, CartItem>(
                "INSERT INTO cart_items (id, cart_id, product_id, quantity) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (cart_id, product_id) \
                 DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = NOW() \
                 RETURNING *",
            )
            .bind(Uuid::now_v7())
            .bind(cart.id)
            .bind(product_id)
            .bind(quantity.as_i32())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| merged_quantity_overflow(e, product_id))?;
            tx.commit().await?;
            tracing::debug!(cart_id = %cart.id, %product_id, quantity = item.quantity, "cart item added");
            return Ok(item);
        }
        Err(ShopError::Conflict(format!("could not settle an active cart for user {user_id}")))
    }

    pub async fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM cart_items ci USING carts c \
             WHERE ci.cart_id = c.id AND c.user_id = $1 AND c.is_active AND ci.product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ShopError::not_found(format!("cart item for product {product_id}")));
        }
        Ok(())
    }
}

/// Loads the items of `cart` and the products they reference in two queries.
/// With `lock_products` the product rows are share-locked until the
/// surrounding transaction ends, so their prices cannot move underneath it.
pub(crate) async fn load_contents(conn: &mut PgConnection, cart: Cart, lock_products: bool) -> Result<CartContents> {
    let items = sqlx::query_as::<_, CartItem>("SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY created_at, id")
        .bind(cart.id)
        .fetch_all(&mut *conn)
        .await?;
    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let sql = if lock_products {
        "SELECT * FROM products WHERE id = ANY($1) ORDER BY id FOR SHARE"
    } else {
        "SELECT * FROM products WHERE id = ANY($1)"
    };
    let products = sqlx::query_as::<_, Product>(sql).bind(product_ids).fetch_all(&mut *conn).await?;
    Ok(CartContents::assemble(cart, items, &products))
}

fn merged_quantity_overflow(err: sqlx::Error, product_id: Uuid) -> ShopError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) => {
            ShopError::InvalidQuantity(format!("cart quantity for product {product_id} would exceed {}", Quantity::MAX))
        }
        other => other.into(),
    }
}

//! Order repository, including the checkout transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, Order, OrderItem, OrderStatus};
use crate::{Result, ShopError};

use super::addresses::find_address;
use super::carts::load_contents;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    status: String,
    total_amount: Decimal,
    shipping_address_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order> {
        let status = self.status.parse::<OrderStatus>()?;
        Ok(Order::restore(
            self.id, self.user_id, status, self.total_amount, self.shipping_address_id, items, self.created_at, self.updated_at,
        ))
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turns the user's active cart into a pending order and retires the cart.
    ///
    /// Runs as one transaction: the cart row is locked, product prices are
    /// read under a share lock and copied into the order items, and the cart
    /// is deactivated. Any error rolls every write back.
    pub async fn checkout(&self, user_id: Uuid, shipping_address_id: Uuid) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let cart = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = $1 AND is_active FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ShopError::EmptyCart)?;
        let contents = load_contents(&mut tx, cart, true).await?;
        let address = find_address(&mut tx, shipping_address_id).await?;

        let order = Order::place(&contents, address.as_ref())?;

        sqlx::query(
            "INSERT INTO orders (id, user_id, status, total_amount, shipping_address_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.status.as_str())
        .bind(order.total_amount)
        .bind(order.shipping_address_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, quantity, price, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(item.id)
            .bind(item.order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE carts SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(contents.cart.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(
            order_id = %order.id,
            %user_id,
            cart_id = %contents.cart.id,
            total_amount = %order.total_amount,
            items = order.items.len(),
            "order placed"
        );
        Ok(order)
    }

    /// The user's orders, newest first, each with its items.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        let order_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY created_at, id")
            .bind(order_ids)
            .fetch_all(self.pool)
            .await?;

        let mut group: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in items {
            group.entry(item.order_id).or_default().push(item);
        }
        rows.into_iter()
            .map(|row| {
                let items = group.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }

    /// One of the user's orders; other users' orders are reported as missing.
    pub async fn get_for_user(&self, user_id: Uuid, id: Uuid) -> Result<Order> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, user_id, id, false).await
    }

    /// Moves the order along its status machine.
    pub async fn update_status(&self, user_id: Uuid, id: Uuid, next: OrderStatus) -> Result<Order> {
        let mut tx = self.pool.begin().await?;
        let mut order = fetch_order(&mut tx, user_id, id, true).await?;
        let from = order.status;
        order.transition(next)?;

        sqlx::query("UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(order.id)
            .bind(order.status.as_str())
            .bind(order.updated_at)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::info!(order_id = %order.id, %from, to = %order.status, "order status changed");
        Ok(order)
    }
}

async fn fetch_order(conn: &mut PgConnection, user_id: Uuid, id: Uuid, for_update: bool) -> Result<Order> {
    let sql = if for_update {
        "SELECT * FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE"
    } else {
        "SELECT * FROM orders WHERE id = $1 AND user_id = $2"
    };
    let row = sqlx::query_as::<_, OrderRow>(sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| ShopError::not_found(format!("order {id}")))?;
    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at, id")
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
    row.into_order(items)
}

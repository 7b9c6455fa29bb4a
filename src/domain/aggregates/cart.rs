//! Cart Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::Product;

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart item joined with the product as it is right now.
#[derive(Clone, Debug, Serialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub product: Product,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal { self.product.line_total(self.item.quantity) }
}

/// A cart with its lines priced from the live catalog.
#[derive(Clone, Debug)]
pub struct CartContents {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
}

impl CartContents {
    /// Builds lines from items and the products they reference; items whose
    /// product is missing from `products` are dropped.
    pub fn assemble(cart: Cart, items: Vec<CartItem>, products: &[Product]) -> Self {
        let lines = items
            .into_iter()
            .filter_map(|item| {
                products
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .map(|product| CartLine { item, product: product.clone() })
            })
            .collect();
        Self { cart, lines }
    }

    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn item_count(&self) -> usize { self.lines.len() }

    /// Sum of current unit price times quantity. Not frozen: follows catalog price changes.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{Price, Slug};
use crate::{Result, ShopError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Current price times `quantity`.
    pub fn line_total(&self, quantity: i32) -> Decimal { self.price * Decimal::from(quantity) }
}

/// Validated field set for inserting or replacing a product.
#[derive(Clone, Debug)]
pub struct ProductDraft {
    pub category_id: Uuid,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub is_available: bool,
}

impl ProductDraft {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        category_id: Uuid, name: impl Into<String>, slug: Option<&str>, description: impl Into<String>,
        price: Decimal, stock: i32, is_available: bool,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() { return Err(ShopError::Validation("product name is empty".into())); }
        if stock < 0 { return Err(ShopError::Validation("stock must not be negative".into())); }
        let slug = match slug {
            Some(raw) => Slug::new(raw)?,
            None => Slug::from_name(&name)?,
        };
        Ok(Self { category_id, name, slug, description: description.into(), price: Price::new(price)?, stock, is_available })
    }
}

//! Product repository.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::aggregates::{Product, ProductDraft};
use crate::{Result, ShopError};

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Newest first, optionally limited to the category with slug `category`.
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT p.* FROM products p JOIN categories c ON c.id = p.category_id \
             WHERE ($1::text IS NULL OR c.slug = $1) ORDER BY p.created_at DESC, p.id DESC",
        )
        .bind(category)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    pub async fn get(&self, id: Uuid) -> Result<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| ShopError::not_found(format!("product {id}")))
    }

    pub async fn create(&self, draft: &ProductDraft) -> Result<Product> {
        self.ensure_category(draft.category_id).await?;
        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, category_id, name, slug, description, price, stock, is_available) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(draft.category_id)
        .bind(&draft.name)
        .bind(draft.slug.as_str())
        .bind(&draft.description)
        .bind(draft.price.amount())
        .bind(draft.stock)
        .bind(draft.is_available)
        .fetch_one(self.pool)
        .await?;
        tracing::info!(product_id = %product.id, slug = %product.slug, "product created");
        Ok(product)
    }

    /// Replaces every editable field. Orders placed earlier keep their own price copies.
    pub async fn update(&self, id: Uuid, draft: &ProductDraft) -> Result<Product> {
        self.ensure_category(draft.category_id).await?;
        sqlx::query_as::<_, Product>(
            "UPDATE products SET category_id = $2, name = $3, slug = $4, description = $5, price = $6, \
             stock = $7, is_available = $8, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(draft.category_id)
        .bind(&draft.name)
        .bind(draft.slug.as_str())
        .bind(&draft.description)
        .bind(draft.price.amount())
        .bind(draft.stock)
        .bind(draft.is_available)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| ShopError::not_found(format!("product {id}")))
    }

    /// Fails with `Conflict` while any order still references the product.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(ShopError::not_found(format!("product {id}")));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    async fn ensure_category(&self, category_id: Uuid) -> Result<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
            .bind(category_id)
            .fetch_one(self.pool)
            .await?;
        if !exists {
            return Err(ShopError::not_found(format!("category {category_id}")));
        }
        Ok(())
    }
}

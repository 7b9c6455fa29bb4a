//! Category repository.
//!
//! Hierarchy queries load the whole table once into a [`CategoryTree`] and
//! walk it in memory; product lookups for a subtree then run as one
//! `category_id = ANY($1)` query instead of one query per category.

use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::aggregates::{Category, CategoryTree, Product};
use crate::domain::value_objects::Slug;
use crate::{Result, ShopError};

/// Validated fields for creating or replacing a category.
#[derive(Clone, Debug)]
pub struct CategoryDraft {
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub parent_id: Option<Uuid>,
}

impl CategoryDraft {
    /// Uses `slug` when given, otherwise derives one from `name`.
    pub fn new(name: impl Into<String>, slug: Option<&str>, description: impl Into<String>, parent_id: Option<Uuid>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ShopError::Validation("category name is empty".into()));
        }
        let slug = match slug {
            Some(raw) => Slug::new(raw)?,
            None => Slug::from_name(&name)?,
        };
        Ok(Self { name, slug, description: description.into(), parent_id })
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every category, indexed for hierarchy walks.
    pub async fn load_tree(&self) -> Result<CategoryTree> {
        Ok(CategoryTree::new(fetch_all(self.pool).await?))
    }

    pub async fn get(&self, id: Uuid) -> Result<Category> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| ShopError::not_found(format!("category {id}")))
    }

    pub async fn create(&self, draft: &CategoryDraft) -> Result<Category> {
        if let Some(parent) = draft.parent_id {
            self.get(parent)
                .await
                .map_err(|e| match e {
                    ShopError::NotFound(_) => ShopError::not_found(format!("parent category {parent}")),
                    other => other,
                })?;
        }
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, slug, description, parent_id) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&draft.name)
        .bind(draft.slug.as_str())
        .bind(&draft.description)
        .bind(draft.parent_id)
        .fetch_one(self.pool)
        .await?;
        tracing::info!(category_id = %category.id, slug = %category.slug, "category created");
        Ok(category)
    }

    /// Replaces a category's fields. Moving it under one of its own
    /// descendants fails with `CycleDetected`; the table lock keeps two
    /// concurrent moves from closing a loop between them.
    pub async fn update(&self, id: Uuid, draft: &CategoryDraft) -> Result<Category> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("LOCK TABLE categories IN SHARE ROW EXCLUSIVE MODE").execute(&mut *tx).await?;

        let tree = CategoryTree::new(fetch_all(&mut *tx).await?);
        tree.get(id)?;
        tree.check_reparent(id, draft.parent_id)?;

        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2, slug = $3, description = $4, parent_id = $5, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&draft.name)
        .bind(draft.slug.as_str())
        .bind(&draft.description)
        .bind(draft.parent_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(category)
    }

    /// Deletes a category with its subcategories and their products. Fails with
    /// `Conflict` while an order still references one of those products.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(ShopError::not_found(format!("category {id}")));
        }
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }

    /// Products filed under `id` or any category below it.
    pub async fn products_in_subtree(&self, id: Uuid) -> Result<Vec<Product>> {
        let ids = self.load_tree().await?.subtree_ids(id)?;
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE category_id = ANY($1) ORDER BY created_at DESC, id DESC",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }
}

async fn fetch_all<'e>(executor: impl PgExecutor<'e>) -> Result<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY created_at, id")
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

//! Category endpoints. Reads are public, writes need an authenticated caller.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::extract::{CurrentUser, IdPath, ValidJson};
use super::AppState;
use crate::db::{CategoryDraft, CategoryRepository};
use crate::domain::aggregates::{Category, CategoryFilter, CategoryNode, Product};
use crate::Result;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/:id", get(get_category).put(update_category).delete(delete_category))
        .route("/categories/:id/subcategories", get(list_subcategories))
        .route("/categories/:id/descendants", get(list_descendants))
        .route("/categories/:id/ancestors", get(list_ancestors))
        .route("/categories/:id/products", get(list_subtree_products))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// `null` for root categories, a category id for its direct children.
    pub parent: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub parent_id: Option<Uuid>,
}

impl CategoryRequest {
    fn into_draft(self) -> Result<CategoryDraft> {
        CategoryDraft::new(self.name, self.slug.as_deref(), self.description, self.parent_id)
    }
}

async fn list_categories(State(s): State<AppState>, Query(p): Query<ListParams>) -> Result<Json<Vec<CategoryNode>>> {
    let filter = CategoryFilter::from_param(p.parent.as_deref())?;
    let tree = CategoryRepository::new(&s.db).load_tree().await?;
    let nodes = tree.list(filter).into_iter().map(|c| tree.node(c.id)).collect::<Result<Vec<_>>>()?;
    Ok(Json(nodes))
}

async fn get_category(State(s): State<AppState>, IdPath(id): IdPath) -> Result<Json<CategoryNode>> {
    let tree = CategoryRepository::new(&s.db).load_tree().await?;
    Ok(Json(tree.node(id)?))
}

async fn create_category(
    State(s): State<AppState>,
    CurrentUser(_): CurrentUser,
    ValidJson(r): ValidJson<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let draft = r.into_draft()?;
    let category = CategoryRepository::new(&s.db).create(&draft).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    IdPath(id): IdPath,
    ValidJson(r): ValidJson<CategoryRequest>,
) -> Result<Json<Category>> {
    let draft = r.into_draft()?;
    let category = CategoryRepository::new(&s.db).update(id, &draft).await?;
    tracing::info!(category_id = %id, %user_id, parent_id = ?category.parent_id, "category updated");
    Ok(Json(category))
}

async fn delete_category(State(s): State<AppState>, CurrentUser(_): CurrentUser, IdPath(id): IdPath) -> Result<StatusCode> {
    CategoryRepository::new(&s.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_subcategories(State(s): State<AppState>, IdPath(id): IdPath) -> Result<Json<Vec<Category>>> {
    let tree = CategoryRepository::new(&s.db).load_tree().await?;
    tree.get(id)?;
    Ok(Json(tree.children(id).into_iter().cloned().collect()))
}

async fn list_descendants(State(s): State<AppState>, IdPath(id): IdPath) -> Result<Json<Vec<Category>>> {
    let tree = CategoryRepository::new(&s.db).load_tree().await?;
    Ok(Json(tree.descendants(id)?.into_iter().cloned().collect()))
}

async fn list_ancestors(State(s): State<AppState>, IdPath(id): IdPath) -> Result<Json<Vec<Category>>> {
    let tree = CategoryRepository::new(&s.db).load_tree().await?;
    Ok(Json(tree.ancestors(id)?.into_iter().cloned().collect()))
}

async fn list_subtree_products(State(s): State<AppState>, IdPath(id): IdPath) -> Result<Json<Vec<Product>>> {
    Ok(Json(CategoryRepository::new(&s.db).products_in_subtree(id).await?))
}

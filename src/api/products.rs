use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::extract::{CurrentUser, IdPath, ValidJson};
use super::AppState;
use crate::db::ProductRepository;
use crate::domain::aggregates::{Product, ProductDraft};
use crate::Result;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", get(get_product).put(update_product).delete(delete_product))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Category slug.
    pub category: Option<String>,
}

fn default_available() -> bool { true }

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

impl ProductRequest {
    fn into_draft(self) -> Result<ProductDraft> {
        ProductDraft::new(
            self.category_id, self.name, self.slug.as_deref(), self.description, self.price, self.stock, self.is_available,
        )
    }
}

async fn list_products(State(s): State<AppState>, Query(p): Query<ListParams>) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductRepository::new(&s.db).list(p.category.as_deref()).await?))
}

async fn get_product(State(s): State<AppState>, IdPath(id): IdPath) -> Result<Json<Product>> {
    Ok(Json(ProductRepository::new(&s.db).get(id).await?))
}

async fn create_product(
    State(s): State<AppState>,
    CurrentUser(_): CurrentUser,
    ValidJson(r): ValidJson<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let draft = r.into_draft()?;
    let product = ProductRepository::new(&s.db).create(&draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    State(s): State<AppState>,
    CurrentUser(_): CurrentUser,
    IdPath(id): IdPath,
    ValidJson(r): ValidJson<ProductRequest>,
) -> Result<Json<Product>> {
    let draft = r.into_draft()?;
    Ok(Json(ProductRepository::new(&s.db).update(id, &draft).await?))
}

async fn delete_product(State(s): State<AppState>, CurrentUser(_): CurrentUser, IdPath(id): IdPath) -> Result<StatusCode> {
    ProductRepository::new(&s.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Cart endpoints. All of them act on the caller's active cart.

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::extract::{CurrentUser, ValidJson};
use super::AppState;
use crate::db::CartRepository;
use crate::domain::aggregates::{CartContents, CartItem, CartLine};
use crate::domain::value_objects::Quantity;
use crate::Result;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart))
        .route("/cart/add-item", post(add_item))
        .route("/cart/remove-item", post(remove_item))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RemoveItemRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct LineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub is_active: bool,
    pub items: Vec<LineView>,
    /// Live total from current product prices.
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CartContents> for CartView {
    fn from(contents: CartContents) -> Self {
        let total = contents.total();
        let cart = contents.cart;
        let items = contents
            .lines
            .into_iter()
            .map(|line| LineView { line_total: line.line_total(), line })
            .collect();
        Self {
            id: cart.id,
            user_id: cart.user_id,
            is_active: cart.is_active,
            items,
            total,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}

async fn get_cart(State(s): State<AppState>, CurrentUser(user_id): CurrentUser) -> Result<Json<CartView>> {
    let contents = CartRepository::new(&s.db).contents(user_id).await?;
    Ok(Json(contents.into()))
}

async fn add_item(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ValidJson(r): ValidJson<AddItemRequest>,
) -> Result<Json<CartItem>> {
    let quantity = Quantity::from_input(r.quantity)?;
    let item = CartRepository::new(&s.db).add_item(user_id, r.product_id, quantity).await?;
    Ok(Json(item))
}

async fn remove_item(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ValidJson(r): ValidJson<RemoveItemRequest>,
) -> Result<StatusCode> {
    CartRepository::new(&s.db).remove_item(user_id, r.product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

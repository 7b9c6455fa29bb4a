//! Order endpoints. Checkout publishes `OrderPlaced`, status changes
//! publish `OrderStatusChanged`, both after the transaction commits.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::extract::{CurrentUser, IdPath, ValidJson};
use super::AppState;
use crate::db::OrderRepository;
use crate::domain::aggregates::{Order, OrderStatus};
use crate::Result;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", patch(update_status))
        .route("/orders/:id/cancel", post(cancel_order))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    /// Id of one of the caller's addresses.
    pub shipping_address: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

async fn create_order(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ValidJson(r): ValidJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let mut order = OrderRepository::new(&s.db).checkout(user_id, r.shipping_address).await?;
    s.events.publish_all(order.take_events()).await;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders(State(s): State<AppState>, CurrentUser(user_id): CurrentUser) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderRepository::new(&s.db).list_for_user(user_id).await?))
}

async fn get_order(State(s): State<AppState>, CurrentUser(user_id): CurrentUser, IdPath(id): IdPath) -> Result<Json<Order>> {
    Ok(Json(OrderRepository::new(&s.db).get_for_user(user_id, id).await?))
}

async fn update_status(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    IdPath(id): IdPath,
    ValidJson(r): ValidJson<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let mut order = OrderRepository::new(&s.db).update_status(user_id, id, r.status).await?;
    s.events.publish_all(order.take_events()).await;
    Ok(Json(order))
}

async fn cancel_order(State(s): State<AppState>, CurrentUser(user_id): CurrentUser, IdPath(id): IdPath) -> Result<Json<Order>> {
    let mut order = OrderRepository::new(&s.db).update_status(user_id, id, OrderStatus::Cancelled).await?;
    s.events.publish_all(order.take_events()).await;
    Ok(Json(order))
}

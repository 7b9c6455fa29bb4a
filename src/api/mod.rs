//! HTTP surface.
//!
//! Every route lives under `/api/v1` except `/health`. Handlers pass the
//! caller's id (see [`extract::CurrentUser`]) explicitly into the
//! repositories and publish domain events only after a write has committed.

use axum::{routing::get, Json, Router};
use serde_json::json;
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::events::EventPublisher;

pub mod addresses;
pub mod cart;
pub mod categories;
mod error;
pub mod extract;
pub mod orders;
pub mod products;
pub mod users;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub events: EventPublisher,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(categories::routes())
        .merge(products::routes())
        .merge(cart::routes())
        .merge(orders::routes())
        .merge(addresses::routes())
        .merge(users::routes());

    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "service": "opensase-shop"})) }))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

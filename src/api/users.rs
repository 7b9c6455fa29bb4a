//! Registration and profile endpoints.
//!
//! Credentials stay with the identity provider. Registration only mirrors the
//! user locally so carts, orders and addresses can reference it.

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use serde::Deserialize;
use validator::Validate;

use super::extract::{CurrentUser, ValidJson};
use super::AppState;
use crate::db::UserRepository;
use crate::domain::aggregates::Registration;
use crate::domain::events::DomainEvent;
use crate::Result;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/profile", get(get_profile).put(update_profile))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 15))]
    pub phone_number: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileRequest {
    #[validate(length(max = 15))]
    pub phone_number: String,
}

async fn register(State(s): State<AppState>, ValidJson(r): ValidJson<RegisterRequest>) -> Result<(StatusCode, Json<Registration>)> {
    let registration = UserRepository::new(&s.db).register(&r.username, &r.email, &r.phone_number).await?;
    let event = DomainEvent::UserRegistered {
        user_id: registration.user.id,
        username: registration.user.username.clone(),
    };
    s.events.publish_all(vec![event]).await;
    Ok((StatusCode::CREATED, Json(registration)))
}

async fn get_profile(State(s): State<AppState>, CurrentUser(user_id): CurrentUser) -> Result<Json<Registration>> {
    Ok(Json(UserRepository::new(&s.db).profile(user_id).await?))
}

async fn update_profile(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ValidJson(r): ValidJson<ProfileRequest>,
) -> Result<Json<Registration>> {
    Ok(Json(UserRepository::new(&s.db).update_profile(user_id, &r.phone_number).await?))
}

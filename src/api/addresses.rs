use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use super::extract::{CurrentUser, IdPath, ValidJson};
use super::AppState;
use crate::db::{AddressRepository, AddressWrite};
use crate::domain::aggregates::{Address, AddressFields, AddressType};
use crate::domain::events::DomainEvent;
use crate::Result;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/addresses", get(list_addresses).post(create_address))
        .route("/addresses/:id", get(get_address).put(update_address).delete(delete_address))
        .route("/addresses/:id/set-default", post(set_default))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddressRequest {
    #[serde(default)]
    pub address_type: AddressType,
    #[validate(length(min = 1, max = 255))]
    pub street_address: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[serde(default)]
    pub is_default: bool,
}

impl From<AddressRequest> for AddressFields {
    fn from(r: AddressRequest) -> Self {
        Self {
            address_type: r.address_type,
            street_address: r.street_address,
            city: r.city,
            state: r.state,
            country: r.country,
            postal_code: r.postal_code,
            is_default: r.is_default,
        }
    }
}

async fn list_addresses(State(s): State<AppState>, CurrentUser(user_id): CurrentUser) -> Result<Json<Vec<Address>>> {
    Ok(Json(AddressRepository::new(&s.db).list(user_id).await?))
}

async fn get_address(State(s): State<AppState>, CurrentUser(user_id): CurrentUser, IdPath(id): IdPath) -> Result<Json<Address>> {
    Ok(Json(AddressRepository::new(&s.db).get(user_id, id).await?))
}

async fn create_address(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    ValidJson(r): ValidJson<AddressRequest>,
) -> Result<(StatusCode, Json<Address>)> {
    let write = AddressRepository::new(&s.db).create(user_id, &r.into()).await?;
    publish_default_change(&s, &write).await;
    Ok((StatusCode::CREATED, Json(write.address)))
}

async fn update_address(
    State(s): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    IdPath(id): IdPath,
    ValidJson(r): ValidJson<AddressRequest>,
) -> Result<Json<Address>> {
    let write = AddressRepository::new(&s.db).update(user_id, id, &r.into()).await?;
    publish_default_change(&s, &write).await;
    Ok(Json(write.address))
}

async fn delete_address(State(s): State<AppState>, CurrentUser(user_id): CurrentUser, IdPath(id): IdPath) -> Result<StatusCode> {
    AddressRepository::new(&s.db).delete(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_default(State(s): State<AppState>, CurrentUser(user_id): CurrentUser, IdPath(id): IdPath) -> Result<Json<Address>> {
    let write = AddressRepository::new(&s.db).set_default(user_id, id).await?;
    publish_default_change(&s, &write).await;
    Ok(Json(write.address))
}

async fn publish_default_change(s: &AppState, write: &AddressWrite) {
    if write.became_default {
        let event = DomainEvent::DefaultAddressChanged { user_id: write.address.user_id, address_id: write.address.id };
        s.events.publish_all(vec![event]).await;
    }
}

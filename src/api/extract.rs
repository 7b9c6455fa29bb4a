//! Request extractors.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::ShopError;

/// Header the authenticating gateway uses to forward the caller's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller.
///
/// Credentials are checked upstream; this only reads the forwarded user id.
/// A missing or malformed header rejects the request with `Unauthorized`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ShopError::Unauthorized("missing X-User-Id header".into()))?;
        raw.to_str()
            .ok()
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map(Self)
            .ok_or_else(|| ShopError::Unauthorized("malformed X-User-Id header".into()))
    }
}

/// A single UUID path segment. Malformed ids reject with `Validation`.
#[derive(Clone, Copy, Debug)]
pub struct IdPath(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ShopError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ShopError::Validation(rejection.body_text()))?;
        Ok(Self(id))
    }
}

/// JSON body that has passed `validator` checks.
pub struct ValidJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ShopError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ShopError::Validation(rejection.body_text()))?;
        value.validate().map_err(|e| ShopError::Validation(e.to_string()))?;
        Ok(Self(value))
    }
}

//! HTTP rendering of [`ShopError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::ShopError;

impl ShopError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidQuantity(_) | Self::InvalidAddress | Self::EmptyCart | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::CycleDetected(_) | Self::InvalidStatusTransition { .. } | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        // Don't expose storage details to clients
        let message = match &self {
            Self::Storage(source) => {
                tracing::error!(error = %source, "storage error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = json!({ "error": { "kind": self.kind(), "message": message } });
        (self.status_code(), Json(body)).into_response()
    }
}

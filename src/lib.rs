//! OpenSASE Shop
//!
//! Catalog, cart and checkout backend.
//!
//! ## Features
//! - Hierarchical product categories
//! - Product catalog management
//! - Per-user carts with live totals
//! - Atomic checkout into immutable orders
//! - Address book with a single default address
//! - Order events published to NATS

use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::OrderStatus;

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod events;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Shipping address does not belong to the current user")]
    InvalidAddress,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Category hierarchy contains a cycle at {0}")]
    CycleDetected(Uuid),

    #[error("Order cannot move from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[source] sqlx::Error),
}

impl ShopError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidQuantity(_) => "invalid_quantity",
            Self::InvalidAddress => "invalid_address",
            Self::EmptyCart => "empty_cart",
            Self::Unauthorized(_) => "unauthorized",
            Self::CycleDetected(_) => "cycle_detected",
            Self::InvalidStatusTransition { .. } => "invalid_status_transition",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<sqlx::Error> for ShopError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("record".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                let constraint = db_err.constraint().unwrap_or("unique constraint");
                Self::Conflict(format!("duplicate value violates {constraint}"))
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                let constraint = db_err.constraint().unwrap_or("foreign key");
                Self::Conflict(format!("referenced record is missing or still in use ({constraint})"))
            }
            other => Self::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShopError>;

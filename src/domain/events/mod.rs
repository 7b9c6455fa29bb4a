//! Domain events
use crate::domain::aggregates::OrderStatus;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    OrderPlaced { order_id: Uuid, user_id: Uuid, cart_id: Uuid, total_amount: Decimal, item_count: usize },
    OrderStatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus },
    UserRegistered { user_id: Uuid, username: String },
    DefaultAddressChanged { user_id: Uuid, address_id: Uuid },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::OrderPlaced { .. } => "shop.order_placed",
            Self::OrderStatusChanged { .. } => "shop.order_status_changed",
            Self::UserRegistered { .. } => "shop.user_registered",
            Self::DefaultAddressChanged { .. } => "shop.default_address_changed",
        }
    }
}

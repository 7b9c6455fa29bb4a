//! Order Aggregate
//!
//! An order is a frozen copy of a cart: every item carries the unit price the
//! product had at checkout, and `total_amount` is computed once from those
//! prices. Only `status` changes afterwards, along
//! `pending -> processing -> shipped -> delivered`, with `cancelled`
//! reachable from every state that is not final.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::aggregates::{Address, CartContents};
use crate::domain::events::DomainEvent;
use crate::{Result, ShopError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Processing) | (Processing, Shipped) | (Shipped, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ShopError::Validation(format!("unknown order status {other:?}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Unit price at checkout.
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

#[derive(Clone, Debug, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub shipping_address_id: Option<Uuid>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Order {
    /// Largest total the `NUMERIC(14, 2)` order column holds.
    pub const MAX_TOTAL: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

    /// Snapshots `cart` into a new pending order shipped to `shipping_address`.
    ///
    /// `shipping_address` is `None` when the requested address does not exist.
    pub fn place(cart: &CartContents, shipping_address: Option<&Address>) -> Result<Self> {
        if cart.is_empty() || !cart.cart.is_active { return Err(ShopError::EmptyCart); }
        let total_amount = cart.total();
        let address = shipping_address
            .filter(|a| a.belongs_to(cart.cart.user_id))
            .ok_or(ShopError::InvalidAddress)?;
        if total_amount > Self::MAX_TOTAL {
            return Err(ShopError::Validation(format!("order total {total_amount} exceeds {}", Self::MAX_TOTAL)));
        }

        let id = Uuid::now_v7();
        let now = Utc::now();
        let items: Vec<OrderItem> = cart
            .lines
            .iter()
            .map(|line| OrderItem {
                id: Uuid::now_v7(),
                order_id: id,
                product_id: line.product.id,
                quantity: line.item.quantity,
                price: line.product.price,
                created_at: now,
            })
            .collect();

        let mut order = Self {
            id, user_id: cart.cart.user_id, status: OrderStatus::Pending, total_amount,
            shipping_address_id: Some(address.id), items, created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::OrderPlaced {
            order_id: id, user_id: order.user_id, cart_id: cart.cart.id, total_amount, item_count: order.items.len(),
        });
        Ok(order)
    }

    /// Rebuilds a stored order; raises no events.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: Uuid, user_id: Uuid, status: OrderStatus, total_amount: Decimal, shipping_address_id: Option<Uuid>,
        items: Vec<OrderItem>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    ) -> Self {
        Self { id, user_id, status, total_amount, shipping_address_id, items, created_at, updated_at, events: vec![] }
    }

    pub fn transition(&mut self, next: OrderStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(ShopError::InvalidStatusTransition { from: self.status, to: next });
        }
        let from = std::mem::replace(&mut self.status, next);
        self.touch();
        self.raise_event(DomainEvent::OrderStatusChanged { order_id: self.id, from, to: next });
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::cart::tests::{cart_with, product};
    use crate::domain::aggregates::AddressType;

    fn address(user_id: Uuid) -> Address {
        let now = Utc::now();
        Address {
            id: Uuid::new_v4(), user_id, address_type: AddressType::Home, street_address: "1 Main St".into(),
            city: "Lagos".into(), state: "LA".into(), country: "NG".into(), postal_code: "100001".into(),
            is_default: true, created_at: now, updated_at: now,
        }
    }

    #[test]
    fn test_place_order_snapshots_cart() {
        let user = Uuid::new_v4();
        let p1 = product(Decimal::new(1000, 2));
        let p2 = product(Decimal::new(500, 2));
        let mut cart = cart_with(user, &[(&p1, 2), (&p2, 1)]);
        let addr = address(user);

        let mut order = Order::place(&cart, Some(&addr)).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, Decimal::new(2500, 2));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].price, Decimal::new(1000, 2));
        assert_eq!(order.shipping_address_id, Some(addr.id));

        // later catalog changes do not reach the order
        cart.lines[0].product.price = Decimal::new(9999, 2);
        assert_eq!(order.total_amount, Decimal::new(2500, 2));
        assert_eq!(order.items.iter().map(OrderItem::line_total).sum::<Decimal>(), order.total_amount);

        let events = order.take_events();
        assert!(matches!(events.as_slice(), [DomainEvent::OrderPlaced { item_count: 2, .. }]));
        assert!(order.take_events().is_empty());
    }

    #[test]
    fn test_place_order_bounds_total() {
        let user = Uuid::new_v4();
        let dear = product(Decimal::new(9_999_999_999, 2));
        let order = Order::place(&cart_with(user, &[(&dear, 2)]), Some(&address(user))).unwrap();
        assert_eq!(order.total_amount, Decimal::new(19_999_999_998, 2));

        let hoard = cart_with(user, &[(&dear, i32::MAX)]);
        assert!(matches!(Order::place(&hoard, Some(&address(user))), Err(ShopError::Validation(_))));
        assert_eq!(Order::MAX_TOTAL, Decimal::new(99_999_999_999_999, 2));
    }

    #[test]
    fn test_place_order_rejects_empty_cart_before_address() {
        let user = Uuid::new_v4();
        let cart = cart_with(user, &[]);
        assert!(matches!(Order::place(&cart, None), Err(ShopError::EmptyCart)));
    }

    #[test]
    fn test_place_order_rejects_foreign_or_missing_address() {
        let user = Uuid::new_v4();
        let p = product(Decimal::ONE);
        let cart = cart_with(user, &[(&p, 1)]);
        assert!(matches!(Order::place(&cart, Some(&address(Uuid::new_v4()))), Err(ShopError::InvalidAddress)));
        assert!(matches!(Order::place(&cart, None), Err(ShopError::InvalidAddress)));
    }

    #[test]
    fn test_status_machine() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Shipped.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_order_workflow() {
        let user = Uuid::new_v4();
        let p = product(Decimal::ONE);
        let mut order = Order::place(&cart_with(user, &[(&p, 1)]), Some(&address(user))).unwrap();
        order.take_events();
        order.transition(OrderStatus::Processing).unwrap();
        order.transition(OrderStatus::Shipped).unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        order.transition(OrderStatus::Delivered).unwrap();
        assert!(matches!(
            order.transition(OrderStatus::Cancelled),
            Err(ShopError::InvalidStatusTransition { from: OrderStatus::Delivered, to: OrderStatus::Cancelled })
        ));
        assert_eq!(order.take_events().len(), 3);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("lost".parse::<OrderStatus>().is_err());
        assert_eq!(serde_json::to_string(&OrderStatus::Cancelled).unwrap(), "\"cancelled\"");
    }
}

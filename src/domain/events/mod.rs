//! Domain events, published fire-and-forget when a broker is configured.

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Cart(CartEvent),
    Checkout(CheckoutEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartEvent {
    ItemAdded {
        store_id: String,
        session_id: String,
        line_key: String,
        quantity: u32,
    },
    ItemRemoved {
        store_id: String,
        session_id: String,
        line_key: String,
    },
    Cleared {
        store_id: String,
        session_id: String,
    },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckoutEvent {
    Completed {
        store_id: String,
        order_number: String,
        total: Decimal,
        item_count: u32,
    },
}

impl DomainEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Cart(CartEvent::ItemAdded { .. }) => "vitrine.cart.item_added",
            Self::Cart(CartEvent::ItemRemoved { .. }) => "vitrine.cart.item_removed",
            Self::Cart(CartEvent::Cleared { .. }) => "vitrine.cart.cleared",
            Self::Checkout(CheckoutEvent::Completed { .. }) => "vitrine.checkout.completed",
        }
    }
}

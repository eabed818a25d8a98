//! Domain layer: cart, checkout form, message rendering, events.

pub mod cart;
pub mod checkout;
pub mod events;
pub mod message;
pub mod value_objects;

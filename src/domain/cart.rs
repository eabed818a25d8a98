//! Cart Aggregate
//!
//! One cart per (store, session). Lines merge on the identity key
//! (product id + selected variants); insertion order is preserved and
//! never re-sorted. Totals are derived on demand so they can never go
//! stale relative to the item list.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub selected_variants: BTreeMap<String, String>,
}

impl CartItem {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Deterministic identity key: product id plus the variant map in
    /// sorted-key order. Two additions with the same key are the same line.
    pub fn identity_key(&self) -> String {
        identity_key(&self.id, &self.selected_variants)
    }
}

/// Identifies one cart line for increment/decrement/remove requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineKey {
    pub id: String,
    #[serde(default)]
    pub selected_variants: BTreeMap<String, String>,
}

impl LineKey {
    pub fn identity_key(&self) -> String {
        identity_key(&self.id, &self.selected_variants)
    }
}

fn identity_key(id: &str, variants: &BTreeMap<String, String>) -> String {
    if variants.is_empty() {
        return id.to_string();
    }
    let pairs: Vec<String> = variants.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{}|{}", id, pairs.join(";"))
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Merges into an existing line with the same identity key, otherwise
    /// appends. A requested quantity of 0 is treated as 1: a line never
    /// enters the cart below the quantity floor.
    pub fn add_item(&mut self, item: CartItem) {
        let quantity = item.quantity.max(1);
        let key = item.identity_key();
        if let Some(existing) = self.items.iter_mut().find(|i| i.identity_key() == key) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem { quantity, ..item });
        }
    }

    /// No-op when the key matches nothing. Returns whether a line changed.
    pub fn increment(&mut self, key: &LineKey) -> bool {
        let key = key.identity_key();
        match self.items.iter_mut().find(|i| i.identity_key() == key) {
            Some(item) => {
                item.quantity = item.quantity.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Decrementing the last unit removes the line entirely; the cart
    /// never holds a line at quantity 0.
    pub fn decrement(&mut self, key: &LineKey) -> bool {
        let key = key.identity_key();
        let Some(pos) = self.items.iter().position(|i| i.identity_key() == key) else {
            return false;
        };
        if self.items[pos].quantity > 1 {
            self.items[pos].quantity -= 1;
        } else {
            self.items.remove(pos);
        }
        true
    }

    pub fn remove(&mut self, key: &LineKey) -> bool {
        let key = key.identity_key();
        let before = self.items.len();
        self.items.retain(|i| i.identity_key() != key);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total(&self) -> Decimal {
        self.items.iter().fold(Decimal::ZERO, |acc, i| acc + i.subtotal())
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

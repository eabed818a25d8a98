//! Cart persistence port.
//!
//! The in-memory cart is the read-of-record within a session; storage is
//! durability, not truth. Loads therefore never fail the caller: a
//! missing or malformed record rehydrates as an empty cart, and save
//! errors are reported so the handler can log and move on.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;

use crate::domain::cart::{Cart, CartItem};
use crate::Result;

#[async_trait]
pub trait CartStorage: Send + Sync {
    async fn load(&self, store_id: &str, session_id: &str) -> Cart;
    async fn save(&self, store_id: &str, session_id: &str, cart: &Cart) -> Result<()>;
    async fn clear(&self, store_id: &str, session_id: &str) -> Result<()>;
}

/// Postgres-backed storage: one row per (store, session), items as JSONB.
#[derive(Clone)]
pub struct PgCartStorage {
    pool: PgPool,
}

impl PgCartStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStorage for PgCartStorage {
    async fn load(&self, store_id: &str, session_id: &str) -> Cart {
        let row: std::result::Result<Option<serde_json::Value>, sqlx::Error> =
            sqlx::query_scalar("SELECT items FROM carts WHERE store_id = $1 AND session_id = $2")
                .bind(store_id)
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await;
        match row {
            Ok(Some(value)) => rehydrate(store_id, session_id, value),
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(store_id, session_id, error = %e, "cart load failed, starting empty");
                Cart::new()
            }
        }
    }

    async fn save(&self, store_id: &str, session_id: &str, cart: &Cart) -> Result<()> {
        let items = serde_json::to_value(cart.items())?;
        sqlx::query(
            "INSERT INTO carts (store_id, session_id, items, updated_at) VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (store_id, session_id) DO UPDATE SET items = $3, updated_at = NOW()",
        )
        .bind(store_id)
        .bind(session_id)
        .bind(items)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear(&self, store_id: &str, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM carts WHERE store_id = $1 AND session_id = $2")
            .bind(store_id)
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn rehydrate(store_id: &str, session_id: &str, value: serde_json::Value) -> Cart {
    match serde_json::from_value::<Vec<CartItem>>(value) {
        Ok(items) => Cart::from_items(items),
        Err(e) => {
            warn!(store_id, session_id, error = %e, "malformed cart payload, starting empty");
            Cart::new()
        }
    }
}

/// In-memory storage for tests. Serializes through JSON so round-trips
/// exercise the same representation as the Postgres rows.
#[derive(Default)]
pub struct MemoryCartStorage {
    entries: Mutex<HashMap<(String, String), String>>,
}

#[async_trait]
impl CartStorage for MemoryCartStorage {
    async fn load(&self, store_id: &str, session_id: &str) -> Cart {
        let key = (store_id.to_string(), session_id.to_string());
        let payload = match self.entries.lock() {
            Ok(entries) => entries.get(&key).cloned(),
            Err(_) => None,
        };
        match payload {
            Some(json) => match serde_json::from_str(&json) {
                Ok(value) => rehydrate(store_id, session_id, value),
                Err(e) => {
                    warn!(store_id, session_id, error = %e, "malformed cart payload, starting empty");
                    Cart::new()
                }
            },
            None => Cart::new(),
        }
    }

    async fn save(&self, store_id: &str, session_id: &str, cart: &Cart) -> Result<()> {
        let key = (store_id.to_string(), session_id.to_string());
        let json = serde_json::to_string(cart.items())?;
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, json);
        }
        Ok(())
    }

    async fn clear(&self, store_id: &str, session_id: &str) -> Result<()> {
        let key = (store_id.to_string(), session_id.to_string());
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(&key);
        }
        Ok(())
    }
}

impl MemoryCartStorage {
    /// Overwrites the raw payload, bypassing serialization. Test hook for
    /// malformed-record behavior.
    pub fn put_raw(&self, store_id: &str, session_id: &str, payload: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                (store_id.to_string(), session_id.to_string()),
                payload.to_string(),
            );
        }
    }
}

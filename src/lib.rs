//! Vitrine Checkout
//!
//! Per-store shopping cart and checkout message service for small
//! storefronts that close sales over WhatsApp instead of a payment
//! pipeline.
//!
//! ## Features
//! - Session-scoped shopping carts with variant-aware line merging
//! - Deterministic order-summary message rendering
//! - WhatsApp deep-link construction for order handoff
//! - Postal-code (CEP) address autofill proxy
//! - Order recording for the store dashboard

use thiserror::Error;

pub mod cep;
pub mod domain;
pub mod storage;

/// Service error taxonomy. Lookup failures have no variant on purpose:
/// the address autofill contract is a silent no-op, never an error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("carrinho vazio")]
    EmptyCart,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

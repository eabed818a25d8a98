//! Vitrine Checkout - per-store cart and WhatsApp checkout service

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use validator::Validate;

use vitrine_checkout::cep::{CepClient, DEFAULT_BASE_URL};
use vitrine_checkout::domain::cart::{Cart, CartItem, LineKey};
use vitrine_checkout::domain::checkout::{validation_messages, AddressFragment, CheckoutForm};
use vitrine_checkout::domain::events::{CartEvent, CheckoutEvent, DomainEvent};
use vitrine_checkout::domain::message::{build_order_message, whatsapp_link};
use vitrine_checkout::domain::value_objects::{CurrencyFormat, PostalCode};
use vitrine_checkout::storage::{CartStorage, PgCartStorage};

#[derive(Clone)]
pub struct AppState {
    pub carts: Arc<dyn CartStorage>,
    pub db: sqlx::PgPool,
    pub nats: Option<async_nats::Client>,
    pub cep: CepClient,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&std::env::var("DATABASE_URL")?)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    let nats = match std::env::var("NATS_URL") {
        Ok(url) => async_nats::connect(url.as_str()).await.ok(),
        Err(_) => None,
    };
    let cep = CepClient::new(
        std::env::var("VIACEP_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
    );
    let state = AppState { carts: Arc::new(PgCartStorage::new(db.clone())), db, nats, cep };

    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "vitrine-checkout"})) }))
        .route("/api/v1/stores/:store/cart/:session", get(get_cart).delete(clear_cart))
        .route("/api/v1/stores/:store/cart/:session/items", post(add_item).delete(remove_item))
        .route("/api/v1/stores/:store/cart/:session/increment", post(increment_item))
        .route("/api/v1/stores/:store/cart/:session/decrement", post(decrement_item))
        .route("/api/v1/stores/:store/checkout", post(checkout))
        .route("/api/v1/cep/:code", get(lookup_cep))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8084".to_string());
    tracing::info!("vitrine-checkout listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: Decimal,
    pub item_count: u32,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self { total: cart.total(), item_count: cart.item_count(), items: cart.into_items() }
    }
}

// A failed write is logged and swallowed: the mutated in-memory cart is
// still what the caller sees.
async fn save_cart(state: &AppState, store: &str, session: &str, cart: &Cart) {
    if let Err(e) = state.carts.save(store, session, cart).await {
        warn!(store, session, error = %e, "cart save failed");
    }
}

async fn publish(state: &AppState, event: DomainEvent) {
    let Some(nats) = &state.nats else { return };
    let payload = match serde_json::to_vec(&event) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "event encode failed");
            return;
        }
    };
    if let Err(e) = nats.publish(event.subject().to_string(), payload.into()).await {
        tracing::debug!(subject = event.subject(), error = %e, "event publish failed");
    }
}

async fn get_cart(
    State(s): State<AppState>,
    Path((store, session)): Path<(String, String)>,
) -> Json<CartView> {
    Json(s.carts.load(&store, &session).await.into())
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: Option<u32>,
    #[serde(default)]
    pub selected_variants: BTreeMap<String, String>,
}

async fn add_item(
    State(s): State<AppState>,
    Path((store, session)): Path<(String, String)>,
    Json(r): Json<AddItemRequest>,
) -> Result<Json<CartView>, (StatusCode, String)> {
    if r.price < Decimal::ZERO {
        return Err(error_response(vitrine_checkout::Error::Validation(
            "price: não pode ser negativo".into(),
        )));
    }
    let mut cart = s.carts.load(&store, &session).await;
    let item = CartItem {
        id: r.id,
        name: r.name,
        price: r.price,
        quantity: r.quantity.unwrap_or(1),
        selected_variants: r.selected_variants,
    };
    let line_key = item.identity_key();
    let quantity = item.quantity.max(1);
    cart.add_item(item);
    save_cart(&s, &store, &session, &cart).await;
    publish(&s, DomainEvent::Cart(CartEvent::ItemAdded {
        store_id: store,
        session_id: session,
        line_key,
        quantity,
    }))
    .await;
    Ok(Json(cart.into()))
}

async fn increment_item(
    State(s): State<AppState>,
    Path((store, session)): Path<(String, String)>,
    Json(key): Json<LineKey>,
) -> Json<CartView> {
    let mut cart = s.carts.load(&store, &session).await;
    if cart.increment(&key) {
        save_cart(&s, &store, &session, &cart).await;
    }
    Json(cart.into())
}

async fn decrement_item(
    State(s): State<AppState>,
    Path((store, session)): Path<(String, String)>,
    Json(key): Json<LineKey>,
) -> Json<CartView> {
    let mut cart = s.carts.load(&store, &session).await;
    if cart.decrement(&key) {
        save_cart(&s, &store, &session, &cart).await;
    }
    Json(cart.into())
}

async fn remove_item(
    State(s): State<AppState>,
    Path((store, session)): Path<(String, String)>,
    Json(key): Json<LineKey>,
) -> Json<CartView> {
    let mut cart = s.carts.load(&store, &session).await;
    if cart.remove(&key) {
        save_cart(&s, &store, &session, &cart).await;
        publish(&s, DomainEvent::Cart(CartEvent::ItemRemoved {
            store_id: store,
            session_id: session,
            line_key: key.identity_key(),
        }))
        .await;
    }
    Json(cart.into())
}

async fn clear_cart(
    State(s): State<AppState>,
    Path((store, session)): Path<(String, String)>,
) -> StatusCode {
    if let Err(e) = s.carts.clear(&store, &session).await {
        warn!(store = %store, session = %session, error = %e, "cart clear failed");
    }
    publish(&s, DomainEvent::Cart(CartEvent::Cleared { store_id: store, session_id: session })).await;
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub session_id: String,
    pub whatsapp: String,
    pub form: CheckoutForm,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order_number: String,
    pub message: String,
    pub whatsapp_link: String,
}

/// Only validation-class errors carry a user-facing status; everything
/// else in the checkout flow degrades without interrupting it.
fn error_response(err: vitrine_checkout::Error) -> (StatusCode, String) {
    use vitrine_checkout::Error;
    let status = match &err {
        Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::EmptyCart => StatusCode::CONFLICT,
        Error::Storage(_) | Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

async fn checkout(
    State(s): State<AppState>,
    Path(store): Path<String>,
    Json(r): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, (StatusCode, String)> {
    if let Err(errors) = r.form.validate() {
        let messages = validation_messages(&errors).join("; ");
        return Err(error_response(vitrine_checkout::Error::Validation(messages)));
    }
    let cart = s.carts.load(&store, &r.session_id).await;
    if cart.is_empty() {
        return Err(error_response(vitrine_checkout::Error::EmptyCart));
    }
    let total = cart.total();
    let message = build_order_message(cart.items(), &r.form, total, &CurrencyFormat::default());
    let link = whatsapp_link(&r.whatsapp, &message).ok_or_else(|| {
        error_response(vitrine_checkout::Error::Validation(
            "whatsapp: informe um número válido".into(),
        ))
    })?;
    let order_number = format!("ORD-{:08}", rand::random::<u32>());

    // Recording and cart cleanup are best-effort; the shopper already has
    // the message in hand.
    if let Err(e) = sqlx::query("INSERT INTO orders (id, store_id, order_number, customer_name, customer_phone, total, message, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)")
        .bind(Uuid::now_v7()).bind(&store).bind(&order_number).bind(&r.form.name).bind(&r.form.phone).bind(total).bind(&message).bind(chrono::Utc::now())
        .execute(&s.db).await
    {
        warn!(store = %store, order_number = %order_number, error = %e, "order record insert failed");
    }
    if let Err(e) = s.carts.clear(&store, &r.session_id).await {
        warn!(store = %store, session = %r.session_id, error = %e, "cart clear after checkout failed");
    }
    publish(&s, DomainEvent::Checkout(CheckoutEvent::Completed {
        store_id: store,
        order_number: order_number.clone(),
        total,
        item_count: cart.item_count(),
    }))
    .await;
    Ok(Json(CheckoutResponse { order_number, message, whatsapp_link: link.to_string() }))
}

async fn lookup_cep(
    State(s): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<AddressFragment>, (StatusCode, String)> {
    let code = PostalCode::new(&code).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    match s.cep.lookup(&code).await {
        Some(fragment) => Ok(Json(fragment)),
        None => Err((StatusCode::NOT_FOUND, "CEP não encontrado".to_string())),
    }
}

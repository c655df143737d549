// server/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use flash_sale::{LedgerEntry, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

// --- Request / Response DTOs ---

/// `product_id` stays a raw string so malformed ids reach admission and come
/// back as validation errors, like every other bad input.
#[derive(Deserialize, Debug)]
pub struct CheckoutRequestPayload {
  pub product_id: String,
  pub quantity: i64,
}

#[derive(Serialize, Debug)]
pub struct CheckoutView {
  pub id: Uuid,
  pub product_id: Uuid,
  /// `None` once the product has been soft-deleted.
  pub product_name: Option<String>,
  pub quantity: u32,
  pub price: Decimal,
  pub discount: Decimal,
  pub total_price: Decimal,
  pub created_at: DateTime<Utc>,
}

impl CheckoutView {
  fn new(entry: LedgerEntry, product_name: Option<String>) -> Self {
    Self {
      id: entry.id.into_uuid(),
      product_id: entry.product_id.into_uuid(),
      product_name,
      quantity: entry.quantity,
      price: entry.unit_price,
      discount: entry.discount.percent(),
      total_price: entry.total,
      created_at: entry.created_at,
    }
  }
}

// --- Handler Implementations ---

/// Accepts a checkout for asynchronous fulfillment. The 202 only means
/// "queued"; the outcome shows up later in `GET /checkouts`.
#[instrument(
    name = "handler::create_checkout",
    skip(app_state, payload, auth_user),
    fields(user_id = %auth_user.user_id, product_id = %payload.product_id, quantity = payload.quantity)
)]
pub async fn create_checkout_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CheckoutRequestPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let job_id = app_state
    .admission
    .enqueue_checkout(&auth_user.user_id.to_string(), &payload.product_id, payload.quantity)
    .await?;
  info!(%job_id, "Checkout accepted.");
  Ok(HttpResponse::Accepted().json(json!({
    "message": "Checkout accepted",
    "job_id": job_id,
  })))
}

#[instrument(name = "handler::list_checkouts", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_checkouts_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let entries = app_state.store.entries_for_user(auth_user.user_id).await?;

  let mut names: HashMap<ProductId, Option<String>> = HashMap::new();
  for entry in &entries {
    if !names.contains_key(&entry.product_id) {
      let product = app_state.store.find_product(entry.product_id).await?;
      names.insert(entry.product_id, product.map(|p| p.name));
    }
  }

  let views: Vec<CheckoutView> = entries
    .into_iter()
    .map(|entry| {
      let name = names.get(&entry.product_id).cloned().flatten();
      CheckoutView::new(entry, name)
    })
    .collect();
  Ok(HttpResponse::Ok().json(json!({ "checkouts": views })))
}

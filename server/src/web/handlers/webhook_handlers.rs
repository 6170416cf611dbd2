// uranai_server/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use uranai::OrderIntake;

use crate::errors::AppError;
use crate::state::AppState;

/// Payment-completion payload as the commerce platform posts it. Everything
/// is optional at the wire level; intake decides what is actually required.
#[derive(Debug, Deserialize)]
pub struct PaymentEvent {
  #[serde(default)]
  pub mode: Option<String>,
  #[serde(default)]
  pub order_id: Option<String>,
  #[serde(default)]
  pub customer_email: Option<String>,
  #[serde(default)]
  pub product_name: Option<String>,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub payment_status: Option<String>,
  #[serde(default)]
  pub price: Option<f64>,
  #[serde(default)]
  pub currency: Option<String>,
}

#[instrument(name = "handler::stores_webhook", skip(app_state, body))]
pub async fn stores_webhook_handler(
  app_state: web::Data<AppState>,
  body: web::Json<PaymentEvent>,
) -> Result<HttpResponse, AppError> {
  let event = body.into_inner();

  // Health probe convention of the commerce platform: bare-text OK, nothing
  // else.
  if event.mode.as_deref() == Some("worker_check") {
    return Ok(HttpResponse::Ok().content_type("text/plain").body("OK"));
  }

  info!(
    order_id = ?event.order_id,
    payment_status = ?event.payment_status,
    price = ?event.price,
    currency = ?event.currency,
    "payment webhook received"
  );

  let intake = OrderIntake {
    order_id: event.order_id.unwrap_or_default(),
    email: event.customer_email.unwrap_or_default(),
    product_name: event.product_name,
    created_at: event.created_at,
    ..Default::default()
  };

  // Webhook failures are an internal signal for the platform's retry loop,
  // so everything (including validation) surfaces as a 500 here.
  let (record, _created) = app_state
    .intake
    .ingest(intake)
    .await
    .map_err(|err| AppError::Internal(err.to_string()))?;

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "data": { "email": record.customer.email, "orderId": record.order_id }
  })))
}

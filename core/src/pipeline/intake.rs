// uranai_core/src/pipeline/intake.rs

//! Intake adapter: turns external events (payment webhook, commerce poll,
//! form response) into durable order records.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::{UranaiError, UranaiResult};
use crate::model::{Customer, FortuneType, OrderRecord};
use crate::store::OrderStore;

/// Normalized inbound order event. The webhook handler and the commerce
/// poller both reduce their payloads to this shape before handing it over.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntake {
  pub order_id: String,
  pub email: String,
  #[serde(default)]
  pub product_name: Option<String>,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub birth_date: Option<String>,
  #[serde(default)]
  pub consultation_text: Option<String>,
  #[serde(default)]
  pub fortune_type: Option<FortuneType>,
}

/// Answers collected from the customer's consultation form, merged into an
/// order that was ingested with payment data only.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponse {
  pub order_id: String,
  pub name: String,
  pub birth_date: String,
  pub consultation_text: String,
  #[serde(default)]
  pub fortune_type: Option<FortuneType>,
}

pub struct IntakeAdapter {
  store: Arc<dyn OrderStore>,
}

impl IntakeAdapter {
  pub fn new(store: Arc<dyn OrderStore>) -> Self {
    IntakeAdapter { store }
  }

  /// Creates the order record for an inbound event.
  ///
  /// Idempotent: re-ingesting an already-known order returns the existing
  /// record untouched (the upstream commerce platform redelivers webhooks,
  /// and the poller re-sees recent orders every cycle). The bool is true
  /// when a record was actually created.
  #[instrument(name = "IntakeAdapter::ingest", skip_all, fields(order_id = %intake.order_id), err(Display))]
  pub async fn ingest(&self, intake: OrderIntake) -> UranaiResult<(OrderRecord, bool)> {
    if intake.order_id.trim().is_empty() {
      return Err(UranaiError::validation("event carries no resolvable order id"));
    }
    if intake.email.trim().is_empty() {
      return Err(UranaiError::validation("event carries no customer email"));
    }

    let customer = Customer {
      name: intake.name.unwrap_or_default(),
      email: intake.email,
      birth_date: intake.birth_date.unwrap_or_default(),
      consultation_text: intake.consultation_text.unwrap_or_default(),
    };
    let mut record = OrderRecord::new(
      intake.order_id,
      customer,
      intake.fortune_type.unwrap_or(FortuneType::General),
    );
    record.product_name = intake.product_name;
    if let Some(created_at) = intake.created_at {
      record.created_at = created_at;
    }

    let (record, created) = self.store.upsert(record).await?;
    if created {
      info!(order_id = %record.order_id, "order record created");
    } else {
      info!(order_id = %record.order_id, "order already known, intake is a no-op");
    }
    Ok((record, created))
  }

  /// Merges consultation-form answers into an existing order so a later
  /// generation pass has complete customer data.
  #[instrument(name = "IntakeAdapter::apply_form_response", skip_all, fields(order_id = %response.order_id), err(Display))]
  pub async fn apply_form_response(&self, response: FormResponse) -> UranaiResult<OrderRecord> {
    let mut missing = Vec::new();
    if response.order_id.trim().is_empty() {
      missing.push("orderId");
    }
    if response.name.trim().is_empty() {
      missing.push("name");
    }
    if response.birth_date.trim().is_empty() {
      missing.push("birthDate");
    }
    if response.consultation_text.trim().is_empty() {
      missing.push("consultationText");
    }
    if !missing.is_empty() {
      return Err(UranaiError::validation(format!("form response incomplete, missing: {}", missing.join(", "))));
    }

    let order_id = response.order_id.clone();
    let record = self
      .store
      .update(
        &order_id,
        Box::new(move |record| {
          record.customer.name = response.name;
          record.customer.birth_date = response.birth_date;
          record.customer.consultation_text = response.consultation_text;
          if let Some(fortune_type) = response.fortune_type {
            record.fortune_type = fortune_type;
          }
        }),
      )
      .await?;

    info!(order_id = %record.order_id, "form response merged into order");
    Ok(record)
  }
}

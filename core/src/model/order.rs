// uranai_core/src/model/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline status of one order. Transitions are owned by the orchestrator;
/// nothing else may move an order between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  /// Ingested, not yet generated.
  Pending,
  /// Fortune text generated and persisted.
  Generated,
  /// A human overwrote the content; any previous artifact is stale.
  Edited,
  /// Artifact rendered and delivered to the customer.
  Sent,
  /// A stage failed; requires operator inspection and manual re-drive.
  Error,
}

impl OrderStatus {
  /// Terminal for `run_once`: no further automatic transition applies.
  pub fn is_terminal(&self) -> bool {
    matches!(self, OrderStatus::Sent | OrderStatus::Error)
  }
}

impl std::fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Generated => "generated",
      OrderStatus::Edited => "edited",
      OrderStatus::Sent => "sent",
      OrderStatus::Error => "error",
    };
    f.write_str(s)
  }
}

/// Fortune category. Each variant maps to exactly one prompt template; the
/// mapping is validated at startup so an unknown category can never fall
/// through to a default template at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FortuneType {
  General,
  Career,
  Love,
  Money,
  Health,
}

impl FortuneType {
  pub const ALL: [FortuneType; 5] = [
    FortuneType::General,
    FortuneType::Career,
    FortuneType::Love,
    FortuneType::Money,
    FortuneType::Health,
  ];

  pub fn parse(s: &str) -> Option<FortuneType> {
    match s {
      "general" => Some(FortuneType::General),
      "career" => Some(FortuneType::Career),
      "love" => Some(FortuneType::Love),
      "money" => Some(FortuneType::Money),
      "health" => Some(FortuneType::Health),
      _ => None,
    }
  }
}

impl std::fmt::Display for FortuneType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      FortuneType::General => "general",
      FortuneType::Career => "career",
      FortuneType::Love => "love",
      FortuneType::Money => "money",
      FortuneType::Health => "health",
    };
    f.write_str(s)
  }
}

/// Customer data required for generation. All four fields must be non-empty
/// before the generator makes any external call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub birth_date: String,
  #[serde(default)]
  pub consultation_text: String,
}

/// Captured stage failure, persisted while `status = error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
  pub message: String,
  pub timestamp: DateTime<Utc>,
}

/// The central entity: durable per-order pipeline state.
///
/// Serialized as one camelCase JSON document per order; the store owns
/// persistence and per-id write serialization, every other component treats
/// records as plain values handed around by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
  pub order_id: String,
  pub customer: Customer,
  pub fortune_type: FortuneType,
  pub status: OrderStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pdf_path: Option<String>,
  /// Accumulated generation cost in JPY. Monotonically increasing across
  /// retries and post-edit regenerations.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub api_cost: Option<f64>,
  #[serde(default)]
  pub edited_by_admin: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<ErrorInfo>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub product_name: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sent_at: Option<DateTime<Utc>>,
}

impl OrderRecord {
  /// A fresh record as the intake adapter creates it.
  pub fn new(order_id: impl Into<String>, customer: Customer, fortune_type: FortuneType) -> Self {
    let now = Utc::now();
    OrderRecord {
      order_id: order_id.into(),
      customer,
      fortune_type,
      status: OrderStatus::Pending,
      content: None,
      pdf_path: None,
      api_cost: None,
      edited_by_admin: false,
      error: None,
      product_name: None,
      created_at: now,
      updated_at: now,
      sent_at: None,
    }
  }

  /// Adds generation cost to the accumulated total, rounded to 2 decimals.
  pub fn accumulate_cost(&mut self, cost: f64) {
    let total = self.api_cost.unwrap_or(0.0) + cost;
    self.api_cost = Some((total * 100.0).round() / 100.0);
  }

  /// Records a stage failure and moves the order to the error state. The
  /// status-before-error is intentionally not retained; an operator inspects
  /// `error` and chooses how to re-drive.
  pub fn record_failure(&mut self, message: impl Into<String>) {
    self.status = OrderStatus::Error;
    self.error = Some(ErrorInfo { message: message.into(), timestamp: Utc::now() });
  }
}

/// Listing filter for the store. All criteria are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
  pub status: Option<OrderStatus>,
  pub created_from: Option<DateTime<Utc>>,
  pub created_to: Option<DateTime<Utc>>,
}

impl OrderFilter {
  pub fn with_status(status: OrderStatus) -> Self {
    OrderFilter { status: Some(status), ..Default::default() }
  }

  pub fn matches(&self, record: &OrderRecord) -> bool {
    if let Some(status) = self.status {
      if record.status != status {
        return false;
      }
    }
    if let Some(from) = self.created_from {
      if record.created_at < from {
        return false;
      }
    }
    if let Some(to) = self.created_to {
      if record.created_at > to {
        return false;
      }
    }
    true
  }
}

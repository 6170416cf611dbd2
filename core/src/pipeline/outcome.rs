// uranai_core/src/pipeline/outcome.rs

//! Outcome types for batch runs.

use serde::Serialize;

use crate::model::OrderStatus;

/// Result of driving one order inside a batch. Failures carry the error text
/// for operator visibility; the full cause also lives in the order record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
  pub order_id: String,
  pub status: OrderStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// Summary of one `run_batch` invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
  /// Pending orders visible when the batch started.
  pub pending_seen: usize,
  /// Orders actually driven (bounded by the batch cap).
  pub items: Vec<BatchItem>,
}

impl BatchSummary {
  pub fn processed(&self) -> usize {
    self.items.len()
  }

  pub fn succeeded(&self) -> usize {
    self.items.iter().filter(|item| item.error.is_none()).count()
  }

  pub fn failed(&self) -> usize {
    self.items.iter().filter(|item| item.error.is_some()).count()
  }
}

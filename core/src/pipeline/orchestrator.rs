// uranai_core/src/pipeline/orchestrator.rs

//! Drives orders through generate → render → deliver, persisting every
//! transition in the order store.
//!
//! State machine:
//!
//! ```text
//! pending --generate--> generated --render+deliver--> sent
//!                          ^                            |
//!                          |        admin edit          v
//!                        edited <---------------------(sent)
//! ```
//!
//! Any in-flight failure moves the order to `error` with the cause recorded;
//! recovery from `error` is always an explicit operator action (edit or
//! regenerate), never automatic.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::delivery::DeliveryDispatcher;
use crate::error::{UranaiError, UranaiResult};
use crate::generator::FortuneGenerator;
use crate::model::{OrderFilter, OrderRecord, OrderStatus};
use crate::pipeline::outcome::{BatchItem, BatchSummary};
use crate::renderer::DocumentRenderer;
use crate::retry::{self, RetryPolicy};
use crate::store::OrderStore;

pub struct Orchestrator {
  store: Arc<dyn OrderStore>,
  generator: FortuneGenerator,
  renderer: DocumentRenderer,
  dispatcher: DeliveryDispatcher,
  retry_policy: RetryPolicy,
}

impl Orchestrator {
  pub fn new(
    store: Arc<dyn OrderStore>,
    generator: FortuneGenerator,
    renderer: DocumentRenderer,
    dispatcher: DeliveryDispatcher,
    retry_policy: RetryPolicy,
  ) -> Self {
    Orchestrator { store, generator, renderer, dispatcher, retry_policy }
  }

  pub fn store(&self) -> &Arc<dyn OrderStore> {
    &self.store
  }

  /// Advances one order by a single stage.
  ///
  /// `pending` generates; `generated`/`edited` renders and delivers; `sent`
  /// and `error` are no-ops returning the current record (`error` waits for
  /// an operator, see `edit_content` / `regenerate_and_send`).
  #[instrument(name = "Orchestrator::run_once", skip(self), err(Display))]
  pub async fn run_once(&self, order_id: &str) -> UranaiResult<OrderRecord> {
    let record = self.store.get(order_id).await?;
    match record.status {
      OrderStatus::Pending => self.generate_stage(record).await,
      OrderStatus::Generated | OrderStatus::Edited => self.send_stage(record, false).await,
      OrderStatus::Sent => {
        debug!(order_id, "order already sent, nothing to do");
        Ok(record)
      }
      OrderStatus::Error => {
        debug!(order_id, "order in error state, awaiting manual re-drive");
        Ok(record)
      }
    }
  }

  /// Drives up to `max_count` pending orders to completion, oldest first.
  ///
  /// One failing order never aborts the batch: its error is recorded on the
  /// record and summarized, and the loop moves on. Orders beyond the bound
  /// stay pending for the next run.
  #[instrument(name = "Orchestrator::run_batch", skip(self), err(Display))]
  pub async fn run_batch(&self, max_count: usize) -> UranaiResult<BatchSummary> {
    let mut pending = self.store.list(&OrderFilter::with_status(OrderStatus::Pending)).await?;
    pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let pending_seen = pending.len();
    if pending_seen > max_count {
      info!(pending_seen, max_count, "batch bound reached, remaining orders deferred to the next run");
    }

    let mut items = Vec::new();
    for record in pending.into_iter().take(max_count) {
      let order_id = record.order_id.clone();
      match self.drive_to_completion(&order_id).await {
        Ok(final_record) => {
          items.push(BatchItem { order_id, status: final_record.status, error: None });
        }
        Err(err) => {
          warn!(order_id = %order_id, error = %err, "order failed inside batch");
          let status = match self.store.get(&order_id).await {
            Ok(current) => current.status,
            Err(_) => OrderStatus::Error,
          };
          items.push(BatchItem { order_id, status, error: Some(err.to_string()) });
        }
      }
    }

    let summary = BatchSummary { pending_seen, items };
    info!(processed = summary.processed(), succeeded = summary.succeeded(), failed = summary.failed(), "batch finished");
    Ok(summary)
  }

  /// Overwrites the fortune content on an operator's behalf.
  ///
  /// Moves the order to `edited` and invalidates the previous artifact; the
  /// next send must re-render because the content changed.
  #[instrument(name = "Orchestrator::edit_content", skip(self, new_content), err(Display))]
  pub async fn edit_content(&self, order_id: &str, new_content: &str) -> UranaiResult<OrderRecord> {
    if new_content.trim().is_empty() {
      return Err(UranaiError::validation("edited content must not be empty"));
    }

    let current = self.store.get(order_id).await?;
    if current.status == OrderStatus::Pending {
      return Err(UranaiError::validation("order has no generated content to edit yet"));
    }

    let content = new_content.to_string();
    let record = self
      .store
      .update(
        order_id,
        Box::new(move |record| {
          record.content = Some(content);
          record.status = OrderStatus::Edited;
          record.edited_by_admin = true;
          record.pdf_path = None;
          record.error = None;
        }),
      )
      .await?;

    info!(order_id, "content edited by admin, previous artifact invalidated");
    Ok(record)
  }

  /// Operator re-drive: re-renders from the current content and re-delivers,
  /// regardless of the order's state. Always produces a fresh artifact.
  #[instrument(name = "Orchestrator::regenerate_and_send", skip(self), err(Display))]
  pub async fn regenerate_and_send(&self, order_id: &str) -> UranaiResult<OrderRecord> {
    let record = self.store.get(order_id).await?;
    self.send_stage(record, true).await
  }

  /// `run_once` until the order stops advancing (sent, error, or a stage
  /// failure). One call takes a pending order all the way through delivery;
  /// the batch worker and the manual single-order endpoint both use this.
  pub async fn drive_to_completion(&self, order_id: &str) -> UranaiResult<OrderRecord> {
    let mut record = self.run_once(order_id).await?;
    while !record.status.is_terminal() {
      let before = record.status;
      record = self.run_once(order_id).await?;
      if record.status == before {
        break;
      }
    }
    Ok(record)
  }

  async fn generate_stage(&self, record: OrderRecord) -> UranaiResult<OrderRecord> {
    let order_id = record.order_id.clone();
    let customer = record.customer.clone();
    let fortune_type = record.fortune_type;

    let generated = match retry::run(&self.retry_policy, "generate", || self.generator.generate(&customer, fortune_type)).await
    {
      Ok(generated) => generated,
      Err(err) => {
        self.mark_failed(&order_id, &err).await;
        return Err(err);
      }
    };

    let cost = generated.cost;
    let updated = self
      .store
      .update(
        &order_id,
        Box::new(move |record| {
          record.content = Some(generated.content);
          record.accumulate_cost(generated.cost);
          record.status = OrderStatus::Generated;
          record.error = None;
        }),
      )
      .await?;

    info!(order_id = %order_id, cost_jpy = cost, total_cost_jpy = ?updated.api_cost, "order generated");
    Ok(updated)
  }

  /// Render + deliver. With `force_render` false, a `generated` order whose
  /// previously persisted artifact still exists reuses it (the content has
  /// not changed since that render); `edited` orders always re-render.
  async fn send_stage(&self, record: OrderRecord, force_render: bool) -> UranaiResult<OrderRecord> {
    let order_id = record.order_id.clone();

    let content = match &record.content {
      Some(content) if !content.trim().is_empty() => content.clone(),
      _ => {
        let err = UranaiError::validation("order has no content to render");
        self.mark_failed(&order_id, &err).await;
        return Err(err);
      }
    };

    let reusable = if !force_render && record.status == OrderStatus::Generated {
      match &record.pdf_path {
        Some(path) if tokio::fs::metadata(path).await.is_ok() => Some(PathBuf::from(path)),
        _ => None,
      }
    } else {
      None
    };

    let artifact = match reusable {
      Some(path) => {
        debug!(order_id = %order_id, path = %path.display(), "reusing existing artifact");
        path
      }
      None => {
        let customer_name = record.customer.name.clone();
        let product_name = record.product_name.clone();
        let render = retry::run(&self.retry_policy, "render", || {
          self.renderer.render(&order_id, &content, &customer_name, product_name.as_deref())
        })
        .await;
        match render {
          Ok(path) => path,
          Err(err) => {
            self.mark_failed(&order_id, &err).await;
            return Err(err);
          }
        }
      }
    };

    // Persist the artifact path before attempting delivery, so a delivery
    // failure leaves a reusable artifact behind for the retry.
    let path_string = artifact.display().to_string();
    let record = {
      let path_string = path_string.clone();
      self
        .store
        .update(&order_id, Box::new(move |record| record.pdf_path = Some(path_string)))
        .await?
    };

    let delivery = retry::run(&self.retry_policy, "deliver", || {
      self.dispatcher.deliver(
        &order_id,
        &record.customer.email,
        artifact.as_path(),
        &record.customer.name,
        record.product_name.as_deref(),
      )
    })
    .await;

    let receipt = match delivery {
      Ok(receipt) => receipt,
      Err(err) => {
        self.mark_failed(&order_id, &err).await;
        return Err(err);
      }
    };

    let updated = self
      .store
      .update(
        &order_id,
        Box::new(move |record| {
          record.status = OrderStatus::Sent;
          record.sent_at = Some(receipt.accepted_at);
          record.error = None;
        }),
      )
      .await?;

    info!(order_id = %order_id, pdf_path = %path_string, sent_at = ?updated.sent_at, "order sent");
    Ok(updated)
  }

  /// Records a stage failure on the order. A storage failure here must not
  /// mask the original stage error, so it is only logged.
  async fn mark_failed(&self, order_id: &str, err: &UranaiError) {
    let message = err.to_string();
    let result = self
      .store
      .update(order_id, Box::new(move |record| record.record_failure(message)))
      .await;
    match result {
      Ok(record) => {
        warn!(order_id, error = ?record.error, "order moved to error state");
      }
      Err(store_err) => {
        error!(order_id, error = %store_err, "failed to record stage failure on order");
      }
    }
  }
}

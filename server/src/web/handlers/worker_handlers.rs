// uranai_server/src/web/handlers/worker_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::auth::require_api_token;

/// Manual batch run, same code path as the scheduled worker.
#[instrument(name = "handler::run_worker", skip(app_state, req))]
pub async fn run_worker_handler(app_state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
  require_api_token(&req, &app_state.config)?;

  let summary = app_state.orchestrator.run_batch(app_state.config.batch_max_orders).await?;

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": format!("processed {} order(s)", summary.processed()),
    "processed": summary.processed(),
    "results": summary.items,
  })))
}

/// Manual drive of a single order all the way to delivery.
#[instrument(name = "handler::process_order", skip(app_state, req))]
pub async fn process_order_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  order_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  require_api_token(&req, &app_state.config)?;

  let order_id = order_id.into_inner();
  let record = app_state.orchestrator.drive_to_completion(&order_id).await?;

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "message": format!("order {} processed", order_id),
    "data": {
      "id": record.order_id,
      "status": record.status,
      "pdfPath": record.pdf_path,
      "sentAt": record.sent_at,
    }
  })))
}

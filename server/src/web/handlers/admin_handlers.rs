// uranai_server/src/web/handlers/admin_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use uranai::OrderFilter;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::auth::require_admin;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
  #[serde(default)]
  pub request_id: Option<String>,
  #[serde(default)]
  pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateRequest {
  #[serde(default)]
  pub request_id: Option<String>,
}

#[instrument(name = "handler::edit_fortune", skip(app_state, req, body))]
pub async fn edit_fortune_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Json<EditRequest>,
) -> Result<HttpResponse, AppError> {
  require_admin(&req, &app_state.config)?;

  let body = body.into_inner();
  let (request_id, content) = match (body.request_id, body.content) {
    (Some(id), Some(content)) if !id.is_empty() && !content.is_empty() => (id, content),
    _ => return Err(AppError::Validation("requestId and content are required".to_string())),
  };

  let record = app_state.orchestrator.edit_content(&request_id, &content).await?;

  // Audit trail for content overwrites.
  info!(order_id = %request_id, "admin edited fortune content");

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "data": { "id": record.order_id, "updatedAt": record.updated_at }
  })))
}

#[instrument(name = "handler::regenerate_fortune", skip(app_state, req, body))]
pub async fn regenerate_fortune_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Json<RegenerateRequest>,
) -> Result<HttpResponse, AppError> {
  require_admin(&req, &app_state.config)?;

  let request_id = match body.into_inner().request_id {
    Some(id) if !id.is_empty() => id,
    _ => return Err(AppError::Validation("requestId is required".to_string())),
  };

  let record = app_state.orchestrator.regenerate_and_send(&request_id).await?;

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "data": { "id": record.order_id, "pdfPath": record.pdf_path, "sentAt": record.sent_at }
  })))
}

#[instrument(name = "handler::list_fortunes", skip(app_state, req))]
pub async fn list_fortunes_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
) -> Result<HttpResponse, AppError> {
  require_admin(&req, &app_state.config)?;

  let records = app_state.store.list(&OrderFilter::default()).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "data": records })))
}

#[instrument(name = "handler::get_fortune", skip(app_state, req))]
pub async fn get_fortune_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  order_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  require_admin(&req, &app_state.config)?;

  let record = app_state.store.get(&order_id.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "data": record })))
}

// uranai_server/src/web/handlers/form_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use uranai::{FormResponse, FortuneType};

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponseBody {
  #[serde(default)]
  pub order_id: Option<String>,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub birth_date: Option<String>,
  #[serde(default)]
  pub consultation_text: Option<String>,
  #[serde(default)]
  pub fortune_type: Option<String>,
}

/// Attaches consultation-form answers to an order ingested from payment
/// data alone. Field-level validation lives in the intake adapter; only the
/// fortune-type string needs decoding here.
#[instrument(name = "handler::form_response", skip(app_state, body))]
pub async fn form_response_handler(
  app_state: web::Data<AppState>,
  body: web::Json<FormResponseBody>,
) -> Result<HttpResponse, AppError> {
  let body = body.into_inner();

  let fortune_type = match body.fortune_type.as_deref() {
    None | Some("") => None,
    Some(raw) => Some(
      FortuneType::parse(raw)
        .ok_or_else(|| AppError::Validation(format!("unknown fortune type '{}'", raw)))?,
    ),
  };

  let response = FormResponse {
    order_id: body.order_id.unwrap_or_default(),
    name: body.name.unwrap_or_default(),
    birth_date: body.birth_date.unwrap_or_default(),
    consultation_text: body.consultation_text.unwrap_or_default(),
    fortune_type,
  };

  let record = app_state.intake.apply_form_response(response).await?;

  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "data": { "id": record.order_id, "updatedAt": record.updated_at }
  })))
}

// uranai_server/src/web/handlers/order_handlers.rs

use std::collections::HashMap;

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::instrument;

use uranai::{OrderFilter, OrderRecord};

use crate::errors::AppError;
use crate::services::OrderQuery;
use crate::state::AppState;
use crate::web::auth::require_admin;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
  #[serde(default)]
  pub page: Option<usize>,
  #[serde(default)]
  pub limit: Option<usize>,
  #[serde(default)]
  pub start_date: Option<String>,
  #[serde(default)]
  pub end_date: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
}

/// Commerce orders joined with pipeline progress by order id.
#[instrument(name = "handler::list_orders", skip(app_state, req, query))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  query: web::Query<OrderListQuery>,
) -> Result<HttpResponse, AppError> {
  require_admin(&req, &app_state.config)?;

  let page = query.page.unwrap_or(1).max(1);
  let limit = query.limit.unwrap_or(20).clamp(1, 100);

  let mut commerce_query = OrderQuery {
    offset: (page - 1) * limit,
    limit,
    ordered_at_from: query.start_date.clone(),
    ordered_at_to: query.end_date.clone(),
    ..Default::default()
  };
  // The platform models "status" as two separate fields.
  match query.status.as_deref() {
    Some("shipped") => commerce_query.delivery_status = Some("shipped".to_string()),
    Some("pending") => commerce_query.delivery_status = Some("waiting".to_string()),
    Some("unpaid") => commerce_query.paid_status = Some("unpaid".to_string()),
    _ => {}
  }

  let commerce_page = app_state
    .commerce
    .list_orders(&commerce_query)
    .await
    .map_err(|err| AppError::Internal(err.to_string()))?;

  // One listing pass instead of a store lookup per order.
  let records = app_state.store.list(&OrderFilter::default()).await?;
  let by_id: HashMap<&str, &OrderRecord> = records.iter().map(|r| (r.order_id.as_str(), r)).collect();

  let orders: Vec<JsonValue> = commerce_page
    .orders
    .iter()
    .map(|order| {
      let fortune = match by_id.get(order.id.as_str()) {
        Some(record) => json!({
          "status": record.status,
          "createdAt": record.created_at,
          "pdfPath": record.pdf_path,
          "lastUpdated": record.updated_at,
        }),
        None => json!({
          "status": "pending",
          "createdAt": null,
          "pdfPath": null,
          "lastUpdated": null,
        }),
      };
      let mut value = serde_json::to_value(order).unwrap_or_else(|_| json!({ "id": order.id }));
      if let Some(map) = value.as_object_mut() {
        map.insert("fortune".to_string(), fortune);
      }
      value
    })
    .collect();

  let total = commerce_page.total;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "data": {
      "orders": orders,
      "pagination": {
        "total": total,
        "page": page,
        "limit": limit,
        "pages": total.div_ceil(limit),
      }
    }
  })))
}

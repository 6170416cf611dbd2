// uranai_server/src/web/auth.rs

//! Static-token request guards. Admin routes use a bearer token, worker
//! routes use the `x-api-token` header the batch tooling already sends.

use actix_web::HttpRequest;

use crate::config::AppConfig;
use crate::errors::{AppError, Result};

pub fn require_admin(req: &HttpRequest, config: &AppConfig) -> Result<()> {
  let header = req
    .headers()
    .get("authorization")
    .and_then(|value| value.to_str().ok())
    .unwrap_or_default();

  let token = match header.strip_prefix("Bearer ") {
    Some(token) => token,
    None => return Err(AppError::Auth("authentication required".to_string())),
  };

  if token != config.admin_api_token {
    return Err(AppError::Forbidden("insufficient permissions".to_string()));
  }
  Ok(())
}

pub fn require_api_token(req: &HttpRequest, config: &AppConfig) -> Result<()> {
  let token = req.headers().get("x-api-token").and_then(|value| value.to_str().ok());
  match token {
    Some(token) if token == config.api_access_token => Ok(()),
    _ => Err(AppError::Auth("invalid API token".to_string())),
  }
}

// uranai_server/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use uranai::UranaiError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Pipeline Error: {source}")]
  Pipeline {
    #[from] // Allows conversion from uranai::UranaiError
    source: UranaiError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String), // For miscellaneous errors
}

// Allow anyhow::Error to be converted into AppError::Internal for convenience
// in handlers using `?` on functions returning anyhow::Result.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    AppError::Internal(err.to_string())
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    // Log the full error when it's turned into a response
    tracing::error!(application_error = %self, "Responding with error");
    // Response bodies follow the commerce platform's `{ success, error }`
    // convention so upstream retry logic can key off one shape.
    match self {
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"success": false, "error": m})),
      AppError::Auth(m) => HttpResponse::Unauthorized().json(json!({"success": false, "error": m})),
      AppError::Forbidden(m) => HttpResponse::Forbidden().json(json!({"success": false, "error": m})),
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"success": false, "error": m})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"success": false, "error": "Configuration issue", "detail": m}))
      }
      AppError::Pipeline { source } => match source {
        UranaiError::Validation { message } => {
          HttpResponse::BadRequest().json(json!({"success": false, "error": message}))
        }
        UranaiError::NotFound { order_id } => HttpResponse::NotFound()
          .json(json!({"success": false, "error": format!("order '{}' not found", order_id)})),
        other => {
          tracing::error!(pipeline_error = ?other, "Pipeline error details");
          HttpResponse::InternalServerError().json(json!({"success": false, "error": other.to_string()}))
        }
      },
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"success": false, "error": m}))
      }
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;

// uranai_core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::model::FortuneType;

/// Error taxonomy for the fulfillment pipeline.
///
/// The split matters for recovery: `Generation`, `Render` and `Delivery` are
/// transient collaborator failures and may be retried; `Validation`,
/// `TemplateNotFound`, `NotFound` and `AlreadyExists` are terminal for the
/// attempt and must reach an operator or the caller unchanged.
#[derive(Debug, Error)]
pub enum UranaiError {
  #[error("Validation failed: {message}")]
  Validation { message: String },

  #[error("No prompt template registered for fortune type '{fortune_type}'")]
  TemplateNotFound { fortune_type: FortuneType },

  #[error("Fortune generation failed. Source: {source}")]
  Generation {
    #[source]
    source: AnyhowError,
  },

  #[error("Document rendering failed. Source: {source}")]
  Render {
    #[source]
    source: AnyhowError,
  },

  #[error("Delivery failed. Source: {source}")]
  Delivery {
    #[source]
    source: AnyhowError,
  },

  #[error("Order '{order_id}' not found")]
  NotFound { order_id: String },

  #[error("Order '{order_id}' already exists")]
  AlreadyExists { order_id: String },

  #[error("Order store failure. Source: {source}")]
  Storage {
    #[source]
    source: AnyhowError,
  },
}

impl UranaiError {
  pub fn validation(message: impl Into<String>) -> Self {
    UranaiError::Validation { message: message.into() }
  }

  pub fn not_found(order_id: impl Into<String>) -> Self {
    UranaiError::NotFound { order_id: order_id.into() }
  }

  /// Whether a retry of the same operation can plausibly succeed.
  ///
  /// This is the single source of truth consulted by the retry decorator;
  /// callers must not special-case variants themselves.
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      UranaiError::Generation { .. }
        | UranaiError::Render { .. }
        | UranaiError::Delivery { .. }
        | UranaiError::Storage { .. }
    )
  }
}

// Collaborator boundaries hand back anyhow::Error; without a variant hint the
// safest classification is a storage-style internal failure.
impl From<AnyhowError> for UranaiError {
  fn from(err: AnyhowError) -> Self {
    if err.downcast_ref::<UranaiError>().is_some() {
      // Already one of ours wrapped in anyhow along the way; unwrap it.
      return match err.downcast::<UranaiError>() {
        Ok(inner) => inner,
        Err(err) => UranaiError::Storage { source: err },
      };
    }
    UranaiError::Storage { source: err }
  }
}

impl From<std::io::Error> for UranaiError {
  fn from(err: std::io::Error) -> Self {
    UranaiError::Storage { source: AnyhowError::new(err) }
  }
}

pub type UranaiResult<T, E = UranaiError> = std::result::Result<T, E>;

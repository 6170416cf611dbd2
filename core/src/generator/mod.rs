// uranai_core/src/generator/mod.rs

//! Content generation: validated customer data in, fortune text + cost out.

pub mod pricing;
pub mod templates;
pub mod text_model;

pub use pricing::Pricing;
pub use templates::PromptTemplate;
pub use text_model::{CannedModel, Completion, TextModel, Usage};

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::error::{UranaiError, UranaiResult};
use crate::model::{Customer, FortuneType};

/// Result of one successful generation call.
#[derive(Debug, Clone)]
pub struct GeneratedFortune {
  pub content: String,
  /// Cost of this call in JPY, already rounded.
  pub cost: f64,
}

pub struct FortuneGenerator {
  model: Arc<dyn TextModel>,
  pricing: Pricing,
  call_timeout: Duration,
}

impl FortuneGenerator {
  pub fn new(model: Arc<dyn TextModel>, pricing: Pricing, call_timeout: Duration) -> Self {
    FortuneGenerator { model, pricing, call_timeout }
  }

  /// Generates fortune content for one order.
  ///
  /// Validation runs before anything else: an incomplete customer must never
  /// reach the external collaborator, both to keep the error classification
  /// honest and to avoid paying for a call that cannot produce a usable
  /// reading.
  #[instrument(name = "FortuneGenerator::generate", skip_all, fields(fortune_type = %fortune_type), err(Display))]
  pub async fn generate(&self, customer: &Customer, fortune_type: FortuneType) -> UranaiResult<GeneratedFortune> {
    validate_customer(customer)?;

    let template = templates::for_type(fortune_type);
    let prompt = templates::fill(template, customer);

    let completion = match tokio::time::timeout(self.call_timeout, self.model.complete(&prompt)).await {
      Ok(Ok(completion)) => completion,
      Ok(Err(err)) => {
        return Err(UranaiError::Generation { source: err.context("text model call failed") });
      }
      Err(_) => {
        return Err(UranaiError::Generation {
          source: anyhow::anyhow!("text model call timed out after {:?}", self.call_timeout),
        });
      }
    };

    if completion.text.trim().is_empty() {
      return Err(UranaiError::Generation { source: anyhow::anyhow!("text model returned empty content") });
    }

    let cost = self.pricing.cost(completion.usage.as_ref());
    info!(cost_jpy = cost, "fortune content generated");

    Ok(GeneratedFortune { content: completion.text, cost })
  }
}

fn validate_customer(customer: &Customer) -> UranaiResult<()> {
  let mut missing = Vec::new();
  if customer.name.trim().is_empty() {
    missing.push("name");
  }
  if customer.birth_date.trim().is_empty() {
    missing.push("birthDate");
  }
  if customer.consultation_text.trim().is_empty() {
    missing.push("consultationText");
  }
  if missing.is_empty() {
    Ok(())
  } else {
    Err(UranaiError::validation(format!("customer data incomplete, missing: {}", missing.join(", "))))
  }
}

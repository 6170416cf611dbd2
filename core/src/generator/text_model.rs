// uranai_core/src/generator/text_model.rs

//! Seam for the external text-generation collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Usage reported by the collaborator for one completion. Absent when the
/// collaborator does not report usage (stubs, some gateway errors).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
  pub input_tokens: u64,
  pub output_tokens: u64,
}

/// One completion returned by the collaborator.
#[derive(Debug, Clone)]
pub struct Completion {
  pub text: String,
  pub usage: Option<Usage>,
}

/// The external model behind a trait so non-production environments can run
/// without credentials or spend. Implementations report failures as
/// `anyhow::Error`; the generator classifies them.
#[async_trait]
pub trait TextModel: Send + Sync {
  async fn complete(&self, prompt: &str) -> anyhow::Result<Completion>;
}

/// Deterministic stub: echoes the prompt under a marker header, reports no
/// usage (so computed cost is 0). Selected by configuration outside
/// production; the generator's validation path is identical either way.
#[derive(Debug, Default)]
pub struct CannedModel;

#[async_trait]
impl TextModel for CannedModel {
  async fn complete(&self, prompt: &str) -> anyhow::Result<Completion> {
    info!("canned model: returning stubbed completion, no external call made");
    let text = format!("（開発環境ダミー鑑定結果）\n\n{}", prompt);
    Ok(Completion { text, usage: None })
  }
}

// uranai_server/src/services/anthropic.rs

//! Live text-model collaborator backed by the Anthropic Messages API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use uranai::{Completion, TextModel, Usage};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4000;

#[derive(Debug, Deserialize)]
struct ApiContentBlock {
  text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
  #[serde(default)]
  input_tokens: u64,
  #[serde(default)]
  output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
  content: Vec<ApiContentBlock>,
  usage: Option<ApiUsage>,
}

pub struct AnthropicModel {
  client: reqwest::Client,
  api_key: String,
  model: String,
}

impl AnthropicModel {
  pub fn new(api_key: String, model: String, timeout: Duration) -> anyhow::Result<Self> {
    // The generator has its own stage timeout; this one bounds the raw HTTP
    // exchange so a dead connection cannot hold the slot longer.
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(AnthropicModel { client, api_key, model })
  }
}

#[async_trait]
impl TextModel for AnthropicModel {
  async fn complete(&self, prompt: &str) -> anyhow::Result<Completion> {
    let body = json!({
      "model": self.model,
      "max_tokens": MAX_TOKENS,
      "temperature": 0.7,
      "messages": [
        { "role": "user", "content": prompt }
      ],
    });

    debug!(model = %self.model, prompt_chars = prompt.chars().count(), "calling text model API");
    let response = self
      .client
      .post(API_URL)
      .header("content-type", "application/json")
      .header("x-api-key", &self.api_key)
      .header("anthropic-version", ANTHROPIC_VERSION)
      .json(&body)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let detail = response.text().await.unwrap_or_default();
      anyhow::bail!("text model API returned {}: {}", status, detail);
    }

    let parsed: ApiResponse = response.json().await?;
    let text = parsed
      .content
      .first()
      .and_then(|block| block.text.clone())
      .ok_or_else(|| anyhow::anyhow!("text model API response carried no content"))?;

    let usage = parsed.usage.map(|u| Usage { input_tokens: u.input_tokens, output_tokens: u.output_tokens });
    info!(model = %self.model, usage = ?usage, "text model call succeeded");

    Ok(Completion { text, usage })
  }
}

// uranai_server/src/services/gmail.rs

//! Live mail transport backed by the Gmail REST API.
//!
//! The message is assembled as a raw RFC 2822 multipart document (plain-text
//! body + base64 attachment) and posted base64url-encoded to
//! `users/me/messages/send`, which is what the API expects.

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::info;

use uranai::{DeliveryReceipt, MailTransport, OutgoingMessage};

const SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";
const BOUNDARY: &str = "uranai_mime_boundary";

#[derive(Debug, Deserialize)]
struct SendResponse {
  id: String,
}

pub struct GmailMailer {
  client: reqwest::Client,
  access_token: String,
}

impl GmailMailer {
  pub fn new(access_token: String, timeout: Duration) -> anyhow::Result<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(GmailMailer { client, access_token })
  }

  async fn build_raw_message(&self, message: &OutgoingMessage) -> anyhow::Result<String> {
    let mut mime = String::new();
    mime.push_str(&format!("From: {} <{}>\r\n", message.from_name, message.from));
    mime.push_str(&format!("To: {}\r\n", message.to));
    mime.push_str(&format!("Subject: {}\r\n", message.subject));
    mime.push_str("MIME-Version: 1.0\r\n");
    mime.push_str(&format!("Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n", BOUNDARY));

    mime.push_str(&format!("--{}\r\n", BOUNDARY));
    mime.push_str("Content-Type: text/plain; charset=utf-8\r\n");
    mime.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
    mime.push_str(&STANDARD.encode(message.body.as_bytes()));
    mime.push_str("\r\n");

    if let Some(attachment) = &message.attachment {
      let bytes = tokio::fs::read(attachment).await?;
      let file_name = attachment
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment.pdf".to_string());

      mime.push_str(&format!("--{}\r\n", BOUNDARY));
      mime.push_str(&format!("Content-Type: application/pdf; name=\"{}\"\r\n", file_name));
      mime.push_str(&format!("Content-Disposition: attachment; filename=\"{}\"\r\n", file_name));
      mime.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
      mime.push_str(&STANDARD.encode(&bytes));
      mime.push_str("\r\n");
    }

    mime.push_str(&format!("--{}--\r\n", BOUNDARY));
    Ok(URL_SAFE_NO_PAD.encode(mime.as_bytes()))
  }
}

#[async_trait]
impl MailTransport for GmailMailer {
  async fn send(&self, message: &OutgoingMessage) -> anyhow::Result<DeliveryReceipt> {
    let raw = self.build_raw_message(message).await?;

    let response = self
      .client
      .post(SEND_URL)
      .bearer_auth(&self.access_token)
      .json(&json!({ "raw": raw }))
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let detail = response.text().await.unwrap_or_default();
      anyhow::bail!("mail API returned {}: {}", status, detail);
    }

    let parsed: SendResponse = response.json().await?;
    info!(message_id = %parsed.id, to = %message.to, "mail accepted by transport");

    Ok(DeliveryReceipt { message_id: parsed.id, accepted_at: Utc::now(), simulated: false })
  }
}

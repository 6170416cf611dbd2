// uranai_core/src/delivery/mod.rs

//! Delivery dispatch: composes the customer email and hands it to the mail
//! transport collaborator. The dispatcher never mutates order state; the
//! orchestrator marks the order sent after a confirmed receipt.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::error::{UranaiError, UranaiResult};

/// Fully composed outbound message, transport-agnostic.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
  pub to: String,
  pub from: String,
  pub from_name: String,
  pub subject: String,
  pub body: String,
  pub attachment: Option<PathBuf>,
}

/// Proof of acceptance from the transport.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
  pub message_id: String,
  pub accepted_at: DateTime<Utc>,
  pub simulated: bool,
}

/// The email transport behind a trait so non-production environments can run
/// without a mail account. Failures are `anyhow::Error`; the dispatcher
/// classifies them as `Delivery`.
#[async_trait]
pub trait MailTransport: Send + Sync {
  async fn send(&self, message: &OutgoingMessage) -> anyhow::Result<DeliveryReceipt>;
}

/// Log-only transport returning a synthetic receipt.
#[derive(Debug, Default)]
pub struct SimulatedMailer;

#[async_trait]
impl MailTransport for SimulatedMailer {
  async fn send(&self, message: &OutgoingMessage) -> anyhow::Result<DeliveryReceipt> {
    info!(
      to = %message.to,
      subject = %message.subject,
      attachment = ?message.attachment,
      "simulated delivery, no mail sent"
    );
    let accepted_at = Utc::now();
    Ok(DeliveryReceipt {
      message_id: format!("sim-{}", accepted_at.timestamp_millis()),
      accepted_at,
      simulated: true,
    })
  }
}

pub struct DeliveryDispatcher {
  transport: Arc<dyn MailTransport>,
  from: String,
  from_name: String,
  send_timeout: Duration,
}

impl DeliveryDispatcher {
  pub fn new(transport: Arc<dyn MailTransport>, from: String, from_name: String, send_timeout: Duration) -> Self {
    DeliveryDispatcher { transport, from, from_name, send_timeout }
  }

  /// Sends the rendered artifact to the customer.
  #[instrument(name = "DeliveryDispatcher::deliver", skip_all, fields(order_id = %order_id, to = %recipient), err(Display))]
  pub async fn deliver(
    &self,
    order_id: &str,
    recipient: &str,
    artifact_path: &Path,
    customer_name: &str,
    product_name: Option<&str>,
  ) -> UranaiResult<DeliveryReceipt> {
    if recipient.trim().is_empty() {
      return Err(UranaiError::validation("recipient email is missing"));
    }
    if tokio::fs::metadata(artifact_path).await.is_err() {
      return Err(UranaiError::validation(format!(
        "artifact not found at '{}'",
        artifact_path.display()
      )));
    }

    let message = OutgoingMessage {
      to: recipient.to_string(),
      from: self.from.clone(),
      from_name: self.from_name.clone(),
      subject: format!("【AI占いサービス】{}様の占い結果", customer_name),
      body: compose_body(order_id, customer_name, product_name, &self.from),
      attachment: Some(artifact_path.to_path_buf()),
    };

    let receipt = match tokio::time::timeout(self.send_timeout, self.transport.send(&message)).await {
      Ok(Ok(receipt)) => receipt,
      Ok(Err(err)) => return Err(UranaiError::Delivery { source: err.context("mail transport rejected the send") }),
      Err(_) => {
        return Err(UranaiError::Delivery {
          source: anyhow::anyhow!("mail transport timed out after {:?}", self.send_timeout),
        });
      }
    };

    info!(message_id = %receipt.message_id, simulated = receipt.simulated, "delivery accepted");
    Ok(receipt)
  }
}

fn compose_body(order_id: &str, customer_name: &str, product_name: Option<&str>, from: &str) -> String {
  format!(
    "\
{name}様

この度はAI占いサービスをご利用いただき、誠にありがとうございます。
ご注文いただいた占い結果を添付ファイルにてお送りいたします。

【注文情報】
商品: {product}
注文番号: {order_id}

添付のPDFファイルをご確認ください。
※PDFファイルが開けない場合は、Adobe Acrobat Readerなどのアプリをご利用ください。

何かご不明な点がございましたら、お気軽にお問い合わせください。
今後ともAI占いサービスをよろしくお願いいたします。

------------------------------
AI占いサービス
Email: {from}
------------------------------
",
    name = customer_name,
    product = product_name.unwrap_or("占いサービス"),
    order_id = order_id,
    from = from,
  )
}

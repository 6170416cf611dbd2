// uranai_server/src/services/stores.rs

//! Commerce platform collaborator: order listing and new-order polling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const ORDERS_URL: &str = "https://api.stores.jp/v1/orders";

/// One order as the commerce platform reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommerceOrder {
  pub id: String,
  #[serde(default)]
  pub customer_name: Option<String>,
  #[serde(default)]
  pub customer_email: Option<String>,
  #[serde(default)]
  pub product_name: Option<String>,
  #[serde(default)]
  pub ordered_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub paid_status: Option<String>,
  #[serde(default)]
  pub price: Option<f64>,
  #[serde(default)]
  pub currency: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
  pub offset: usize,
  pub limit: usize,
  pub ordered_at_from: Option<String>,
  pub ordered_at_to: Option<String>,
  pub delivery_status: Option<String>,
  pub paid_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPage {
  #[serde(default)]
  pub orders: Vec<CommerceOrder>,
  #[serde(default)]
  pub total: usize,
}

#[async_trait]
pub trait CommerceClient: Send + Sync {
  async fn list_orders(&self, query: &OrderQuery) -> anyhow::Result<OrderPage>;
}

pub struct StoresCommerceClient {
  client: reqwest::Client,
  api_key: String,
}

impl StoresCommerceClient {
  pub fn new(api_key: String, timeout: Duration) -> anyhow::Result<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(StoresCommerceClient { client, api_key })
  }
}

#[async_trait]
impl CommerceClient for StoresCommerceClient {
  async fn list_orders(&self, query: &OrderQuery) -> anyhow::Result<OrderPage> {
    let mut params: Vec<(&str, String)> = vec![
      ("offset", query.offset.to_string()),
      ("limit", query.limit.max(1).to_string()),
    ];
    if let Some(from) = &query.ordered_at_from {
      params.push(("ordered_at_from", from.clone()));
    }
    if let Some(to) = &query.ordered_at_to {
      params.push(("ordered_at_to", to.clone()));
    }
    if let Some(delivery_status) = &query.delivery_status {
      params.push(("delivery_status", delivery_status.clone()));
    }
    if let Some(paid_status) = &query.paid_status {
      params.push(("paid_status", paid_status.clone()));
    }

    debug!(?params, "querying commerce platform for orders");
    let response = self
      .client
      .get(ORDERS_URL)
      .bearer_auth(&self.api_key)
      .query(&params)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let detail = response.text().await.unwrap_or_default();
      anyhow::bail!("commerce API returned {}: {}", status, detail);
    }

    Ok(response.json().await?)
  }
}

/// No-credentials fallback: an empty order feed. Keeps the listing endpoint
/// and the order checker alive in environments without a commerce API key.
#[derive(Debug, Default)]
pub struct NullCommerceClient;

#[async_trait]
impl CommerceClient for NullCommerceClient {
  async fn list_orders(&self, _query: &OrderQuery) -> anyhow::Result<OrderPage> {
    Ok(OrderPage::default())
  }
}

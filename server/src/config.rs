// uranai_server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Root for durable state: order records under `fortunes/`, artifacts
  /// under `pdfs/`.
  pub data_dir: PathBuf,

  // Text model collaborator
  pub anthropic_api_key: Option<String>,
  pub anthropic_model: String,
  /// Route generation to the deterministic stub instead of the live model.
  pub use_canned_model: bool,

  // Mail collaborator
  pub gmail_access_token: Option<String>,
  pub email_from: String,
  pub email_from_name: String,
  /// Log-only delivery with a synthetic receipt.
  pub simulate_delivery: bool,

  // Commerce platform collaborator
  pub stores_api_key: Option<String>,

  // API tokens
  pub admin_api_token: String,
  pub api_access_token: String,

  // Scheduler
  pub enable_scheduler: bool,
  pub enable_order_checker: bool,
  pub fortune_scheduler_cron: String,
  pub order_checker_cron: String,
  pub process_pending_on_startup: bool,

  // Pipeline tuning
  pub batch_max_orders: usize,
  pub stage_timeout: Duration,
  pub retry_max_attempts: u32,
  pub retry_base_delay: Duration,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let get_bool = |var_name: &str, default: bool| {
      env::var(var_name).map(|v| v == "true" || v == "1").unwrap_or(default)
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "3000".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;

    let data_dir = PathBuf::from(get_env("DATA_DIR").unwrap_or_else(|_| "./data".to_string()));

    let use_canned_model = get_bool("USE_CANNED_MODEL", false);
    let anthropic_api_key = env::var("ANTHROPIC_API_KEY").ok();
    if !use_canned_model && anthropic_api_key.is_none() {
      return Err(AppError::Config(
        "ANTHROPIC_API_KEY is required unless USE_CANNED_MODEL=true".to_string(),
      ));
    }
    let anthropic_model =
      get_env("ANTHROPIC_MODEL").unwrap_or_else(|_| "claude-3-5-sonnet-20241022".to_string());

    let simulate_delivery = get_bool("SIMULATE_DELIVERY", false);
    let gmail_access_token = env::var("GMAIL_ACCESS_TOKEN").ok();
    if !simulate_delivery && gmail_access_token.is_none() {
      return Err(AppError::Config(
        "GMAIL_ACCESS_TOKEN is required unless SIMULATE_DELIVERY=true".to_string(),
      ));
    }
    let email_from = get_env("EMAIL_FROM").unwrap_or_else(|_| "fortune@example.com".to_string());
    let email_from_name = get_env("EMAIL_FROM_NAME").unwrap_or_else(|_| "AI占いサービス".to_string());

    let stores_api_key = env::var("STORES_API_KEY").ok();

    let admin_api_token = get_env("ADMIN_API_TOKEN").unwrap_or_else(|_| "dev-token".to_string());
    let api_access_token = get_env("API_ACCESS_TOKEN").unwrap_or_else(|_| "dev-token".to_string());

    let batch_max_orders = get_env("BATCH_MAX_ORDERS")
      .unwrap_or_else(|_| "5".to_string())
      .parse::<usize>()
      .map_err(|e| AppError::Config(format!("Invalid BATCH_MAX_ORDERS: {}", e)))?;

    let stage_timeout_secs = get_env("STAGE_TIMEOUT_SECS")
      .unwrap_or_else(|_| "60".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid STAGE_TIMEOUT_SECS: {}", e)))?;

    let retry_max_attempts = get_env("RETRY_MAX_ATTEMPTS")
      .unwrap_or_else(|_| "3".to_string())
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid RETRY_MAX_ATTEMPTS: {}", e)))?;

    let retry_base_delay_ms = get_env("RETRY_BASE_DELAY_MS")
      .unwrap_or_else(|_| "200".to_string())
      .parse::<u64>()
      .map_err(|e| AppError::Config(format!("Invalid RETRY_BASE_DELAY_MS: {}", e)))?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      data_dir,
      anthropic_api_key,
      anthropic_model,
      use_canned_model,
      gmail_access_token,
      email_from,
      email_from_name,
      simulate_delivery,
      stores_api_key,
      admin_api_token,
      api_access_token,
      enable_scheduler: get_bool("ENABLE_SCHEDULER", false),
      enable_order_checker: get_bool("ENABLE_ORDER_CHECKER", false),
      fortune_scheduler_cron: env::var("FORTUNE_SCHEDULER_CRON").unwrap_or_else(|_| "*/5 * * * *".to_string()),
      order_checker_cron: env::var("ORDER_CHECKER_CRON").unwrap_or_else(|_| "*/15 * * * *".to_string()),
      process_pending_on_startup: get_bool("PROCESS_PENDING_ON_STARTUP", false),
      batch_max_orders,
      stage_timeout: Duration::from_secs(stage_timeout_secs),
      retry_max_attempts,
      retry_base_delay: Duration::from_millis(retry_base_delay_ms),
    })
  }

  pub fn fortunes_dir(&self) -> PathBuf {
    self.data_dir.join("fortunes")
  }

  pub fn pdf_dir(&self) -> PathBuf {
    self.data_dir.join("pdfs")
  }
}

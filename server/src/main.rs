// uranai_server/src/main.rs

// Declare modules for the application
mod config;
mod errors;
mod scheduler;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::scheduler::{SchedulerDeps, SchedulerState};
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan; // For span events in tracing

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Initialize tracing subscriber for logging
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  tracing::info!("Starting fortune fulfillment server...");

  // Load application configuration
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  // A broken template table must fail here, not at the first paid order.
  if let Err(e) = uranai::generator::templates::validate() {
    tracing::error!(error = %e, "Prompt template validation failed.");
    panic!("Template error: {}", e);
  }

  // Wire the pipeline (store, collaborators, orchestrator, intake)
  let app_state = match AppState::build(app_config.clone()) {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to build application state.");
      panic!("Bootstrap error: {}", e);
    }
  };

  // Optionally drain orders that were pending when the process last stopped.
  if app_config.process_pending_on_startup {
    let orchestrator = app_state.orchestrator.clone();
    let batch_max = app_config.batch_max_orders;
    tokio::spawn(async move {
      tracing::info!("Processing pending orders left over from the previous run...");
      if let Err(e) = orchestrator.run_batch(batch_max).await {
        tracing::error!(error = %e, "Startup batch run failed.");
      }
    });
  }

  // Start the scheduler when enabled
  if app_config.enable_scheduler || app_config.enable_order_checker {
    let deps = SchedulerDeps {
      config: app_config.clone(),
      orchestrator: app_state.orchestrator.clone(),
      intake: app_state.intake.clone(),
      commerce: app_state.commerce.clone(),
    };
    match SchedulerState::start(deps) {
      Ok(scheduler_state) => {
        *app_state.scheduler.lock().expect("scheduler slot poisoned") = Some(scheduler_state);
        tracing::info!("Scheduler started.");
      }
      Err(e) => {
        tracing::error!(error = %e, "Failed to start scheduler.");
        panic!("Scheduler error: {}", e);
      }
    }
  } else {
    tracing::info!("Scheduler disabled by configuration.");
  }

  // Configure and Start Actix Web Server
  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(web::routes::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}

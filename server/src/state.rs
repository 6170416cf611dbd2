// uranai_server/src/state.rs
use std::sync::{Arc, Mutex};

use tracing::info;

use uranai::{
  CannedModel, DeliveryDispatcher, DocumentRenderer, FileOrderStore, FortuneGenerator, IntakeAdapter, MailTransport,
  Orchestrator, OrderStore, PdfEngine, Pricing, RetryPolicy, SimulatedMailer, TextModel,
};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::scheduler::SchedulerState;
use crate::services::{AnthropicModel, CommerceClient, GmailMailer, NullCommerceClient, StoresCommerceClient};

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub store: Arc<dyn OrderStore>,
  pub orchestrator: Arc<Orchestrator>,
  pub intake: Arc<IntakeAdapter>,
  pub commerce: Arc<dyn CommerceClient>,
  /// Slot for the running scheduler; the restart endpoint swaps the value.
  /// Lock hold times are trivial (status snapshot, handle swap), so a std
  /// mutex is enough.
  pub scheduler: Arc<Mutex<Option<SchedulerState>>>,
}

impl AppState {
  /// Wires the pipeline: store, collaborators (live or stubbed per config),
  /// orchestrator, intake. The scheduler slot starts empty; `main` fills it
  /// when scheduling is enabled.
  pub fn build(config: Arc<AppConfig>) -> Result<AppState> {
    let store = Arc::new(FileOrderStore::new(config.fortunes_dir()));
    let dyn_store: Arc<dyn OrderStore> = store;

    let model: Arc<dyn TextModel> = if config.use_canned_model {
      info!("generation routed to the canned model (no external calls)");
      Arc::new(CannedModel)
    } else {
      let api_key = config
        .anthropic_api_key
        .clone()
        .ok_or_else(|| AppError::Config("ANTHROPIC_API_KEY missing".to_string()))?;
      Arc::new(AnthropicModel::new(api_key, config.anthropic_model.clone(), config.stage_timeout)?)
    };

    let transport: Arc<dyn MailTransport> = if config.simulate_delivery {
      info!("delivery simulation enabled (log-only, synthetic receipts)");
      Arc::new(SimulatedMailer)
    } else {
      let token = config
        .gmail_access_token
        .clone()
        .ok_or_else(|| AppError::Config("GMAIL_ACCESS_TOKEN missing".to_string()))?;
      Arc::new(GmailMailer::new(token, config.stage_timeout)?)
    };

    let commerce: Arc<dyn CommerceClient> = match &config.stores_api_key {
      Some(api_key) => Arc::new(StoresCommerceClient::new(api_key.clone(), config.stage_timeout)?),
      None => {
        info!("no commerce API key configured, order polling/listing sees an empty feed");
        Arc::new(NullCommerceClient)
      }
    };

    let generator = FortuneGenerator::new(model, Pricing::default(), config.stage_timeout);
    let renderer = DocumentRenderer::new(Arc::new(PdfEngine), config.pdf_dir(), config.stage_timeout);
    let dispatcher = DeliveryDispatcher::new(
      transport,
      config.email_from.clone(),
      config.email_from_name.clone(),
      config.stage_timeout,
    );
    let retry_policy = RetryPolicy { max_attempts: config.retry_max_attempts, base_delay: config.retry_base_delay };

    let orchestrator = Arc::new(Orchestrator::new(
      dyn_store.clone(),
      generator,
      renderer,
      dispatcher,
      retry_policy,
    ));
    let intake = Arc::new(IntakeAdapter::new(dyn_store.clone()));

    Ok(AppState {
      config,
      store: dyn_store,
      orchestrator,
      intake,
      commerce,
      scheduler: Arc::new(Mutex::new(None)),
    })
  }
}

// tests/common/mod.rs
#![allow(dead_code)] // Allow unused helpers in this common test module

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::Level;

use uranai::{
  Completion, Customer, DeliveryDispatcher, DeliveryReceipt, DocumentEngine, DocumentRenderer, FileOrderStore,
  FortuneGenerator, FortuneType, MailTransport, Orchestrator, OrderRecord, OrderStore, OutgoingMessage, PdfEngine,
  Pricing, RetryPolicy, TextModel, Usage,
};

// --- Scripted collaborators ---

/// Text model double: deterministic text, optional usage, optional leading
/// failures, and a call counter for asserting "zero external calls".
pub struct ScriptedModel {
  pub calls: AtomicUsize,
  fail_first: usize,
  text: String,
  usage: Option<Usage>,
}

impl ScriptedModel {
  pub fn ok(text: &str) -> Arc<Self> {
    Arc::new(ScriptedModel { calls: AtomicUsize::new(0), fail_first: 0, text: text.to_string(), usage: None })
  }

  pub fn with_usage(text: &str, usage: Usage) -> Arc<Self> {
    Arc::new(ScriptedModel { calls: AtomicUsize::new(0), fail_first: 0, text: text.to_string(), usage: Some(usage) })
  }

  pub fn failing_first(fail_first: usize, text: &str) -> Arc<Self> {
    Arc::new(ScriptedModel { calls: AtomicUsize::new(0), fail_first, text: text.to_string(), usage: None })
  }

  pub fn call_count(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl TextModel for ScriptedModel {
  async fn complete(&self, _prompt: &str) -> anyhow::Result<Completion> {
    let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
    if call <= self.fail_first {
      anyhow::bail!("scripted model outage (call {})", call);
    }
    Ok(Completion { text: self.text.clone(), usage: self.usage })
  }
}

/// Mail transport double with the same failure scripting.
pub struct CountingMailer {
  pub calls: AtomicUsize,
  fail_first: usize,
}

impl CountingMailer {
  pub fn ok() -> Arc<Self> {
    Arc::new(CountingMailer { calls: AtomicUsize::new(0), fail_first: 0 })
  }

  pub fn failing_first(fail_first: usize) -> Arc<Self> {
    Arc::new(CountingMailer { calls: AtomicUsize::new(0), fail_first })
  }

  pub fn call_count(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl MailTransport for CountingMailer {
  async fn send(&self, message: &OutgoingMessage) -> anyhow::Result<DeliveryReceipt> {
    let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
    if call <= self.fail_first {
      anyhow::bail!("scripted transport outage (call {})", call);
    }
    Ok(DeliveryReceipt {
      message_id: format!("test-{}-{}", message.to, call),
      accepted_at: Utc::now(),
      simulated: true,
    })
  }
}

/// Document engine double that always fails.
pub struct BrokenEngine;

#[async_trait]
impl DocumentEngine for BrokenEngine {
  async fn render(&self, _layout: &uranai::renderer::DocumentLayout) -> anyhow::Result<Vec<u8>> {
    anyhow::bail!("scripted engine failure")
  }
}

// --- Harness ---

pub struct TestHarness {
  pub orchestrator: Orchestrator,
  pub store: Arc<FileOrderStore>,
  pub model: Arc<ScriptedModel>,
  pub mailer: Arc<CountingMailer>,
  pub pdf_dir: PathBuf,
  // Held so the directory outlives the test body.
  _dir: tempfile::TempDir,
}

pub fn harness(model: Arc<ScriptedModel>, mailer: Arc<CountingMailer>) -> TestHarness {
  harness_with(model, mailer, Arc::new(PdfEngine), RetryPolicy::none())
}

pub fn harness_with(
  model: Arc<ScriptedModel>,
  mailer: Arc<CountingMailer>,
  engine: Arc<dyn DocumentEngine>,
  retry_policy: RetryPolicy,
) -> TestHarness {
  let dir = tempfile::tempdir().expect("tempdir");
  let fortunes_dir = dir.path().join("fortunes");
  let pdf_dir = dir.path().join("pdfs");

  let store = Arc::new(FileOrderStore::new(&fortunes_dir));
  let dyn_store: Arc<dyn OrderStore> = store.clone();

  let timeout = Duration::from_secs(5);
  let generator = FortuneGenerator::new(model.clone(), Pricing::default(), timeout);
  let renderer = DocumentRenderer::new(engine, &pdf_dir, timeout);
  let dispatcher = DeliveryDispatcher::new(
    mailer.clone(),
    "fortune@example.com".to_string(),
    "AI占いサービス".to_string(),
    timeout,
  );

  let orchestrator = Orchestrator::new(dyn_store, generator, renderer, dispatcher, retry_policy);

  TestHarness { orchestrator, store, model, mailer, pdf_dir, _dir: dir }
}

// --- Fixtures ---

pub fn customer(name: &str, email: &str) -> Customer {
  Customer {
    name: name.to_string(),
    email: email.to_string(),
    birth_date: "1985-06-15".to_string(),
    consultation_text: "今後のキャリアについて悩んでいます".to_string(),
  }
}

pub async fn seed_pending(store: &Arc<FileOrderStore>, order_id: &str, customer: Customer, fortune_type: FortuneType) -> OrderRecord {
  let record = OrderRecord::new(order_id, customer, fortune_type);
  store.create(record).await.expect("seed pending order")
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

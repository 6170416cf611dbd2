// tests/intake_tests.rs
mod common;

use common::*;
use serial_test::serial;
use uranai::{FormResponse, FortuneType, IntakeAdapter, OrderIntake, OrderStatus, OrderStore, UranaiError};

fn intake_event(order_id: &str) -> OrderIntake {
  OrderIntake {
    order_id: order_id.to_string(),
    email: "taro@example.com".to_string(),
    product_name: Some("AI占いサービス".to_string()),
    ..Default::default()
  }
}

#[tokio::test]
#[serial]
async fn test_ingest_creates_pending_record() {
  setup_tracing();
  let h = harness(ScriptedModel::ok("鑑定文"), CountingMailer::ok());
  let adapter = IntakeAdapter::new(h.store.clone());

  let (record, created) = adapter.ingest(intake_event("ORD_001")).await.unwrap();
  assert!(created);
  assert_eq!(record.status, OrderStatus::Pending);
  assert_eq!(record.customer.email, "taro@example.com");
  assert_eq!(record.fortune_type, FortuneType::General);
  assert_eq!(record.product_name.as_deref(), Some("AI占いサービス"));
}

#[tokio::test]
#[serial]
async fn test_ingest_twice_yields_exactly_one_record() {
  setup_tracing();
  let h = harness(ScriptedModel::ok("鑑定文"), CountingMailer::ok());
  let adapter = IntakeAdapter::new(h.store.clone());

  let (first, created_first) = adapter.ingest(intake_event("ORD_001")).await.unwrap();
  let (second, created_second) = adapter.ingest(intake_event("ORD_001")).await.unwrap();

  assert!(created_first);
  assert!(!created_second);
  assert_eq!(first, second);

  let all = h.store.list(&uranai::OrderFilter::default()).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].order_id, "ORD_001");
}

#[tokio::test]
#[serial]
async fn test_ingest_rejects_event_without_order_id_or_email() {
  setup_tracing();
  let h = harness(ScriptedModel::ok("鑑定文"), CountingMailer::ok());
  let adapter = IntakeAdapter::new(h.store.clone());

  let mut no_id = intake_event("");
  no_id.order_id = String::new();
  let err = adapter.ingest(no_id).await.unwrap_err();
  assert!(matches!(err, UranaiError::Validation { .. }));

  let mut no_email = intake_event("ORD_001");
  no_email.email = String::new();
  let err = adapter.ingest(no_email).await.unwrap_err();
  assert!(matches!(err, UranaiError::Validation { .. }));
}

#[tokio::test]
#[serial]
async fn test_form_response_completes_customer_data() {
  setup_tracing();
  let h = harness(ScriptedModel::ok("鑑定文"), CountingMailer::ok());
  let adapter = IntakeAdapter::new(h.store.clone());

  adapter.ingest(intake_event("ORD_001")).await.unwrap();

  let response = FormResponse {
    order_id: "ORD_001".to_string(),
    name: "太郎".to_string(),
    birth_date: "1985-06-15".to_string(),
    consultation_text: "キャリアの相談です".to_string(),
    fortune_type: Some(FortuneType::Career),
  };
  let record = adapter.apply_form_response(response).await.unwrap();

  assert_eq!(record.customer.name, "太郎");
  assert_eq!(record.customer.birth_date, "1985-06-15");
  assert_eq!(record.fortune_type, FortuneType::Career);
  // Email from the payment event is untouched.
  assert_eq!(record.customer.email, "taro@example.com");
}

#[tokio::test]
#[serial]
async fn test_form_response_for_unknown_order_is_not_found() {
  setup_tracing();
  let h = harness(ScriptedModel::ok("鑑定文"), CountingMailer::ok());
  let adapter = IntakeAdapter::new(h.store.clone());

  let response = FormResponse {
    order_id: "MISSING".to_string(),
    name: "太郎".to_string(),
    birth_date: "1985-06-15".to_string(),
    consultation_text: "相談".to_string(),
    fortune_type: None,
  };
  let err = adapter.apply_form_response(response).await.unwrap_err();
  assert!(matches!(err, UranaiError::NotFound { .. }));
}

#[tokio::test]
#[serial]
async fn test_form_response_requires_all_fields() {
  setup_tracing();
  let h = harness(ScriptedModel::ok("鑑定文"), CountingMailer::ok());
  let adapter = IntakeAdapter::new(h.store.clone());
  adapter.ingest(intake_event("ORD_001")).await.unwrap();

  let response = FormResponse {
    order_id: "ORD_001".to_string(),
    name: "太郎".to_string(),
    birth_date: String::new(),
    consultation_text: "相談".to_string(),
    fortune_type: None,
  };
  let err = adapter.apply_form_response(response).await.unwrap_err();
  assert!(matches!(err, UranaiError::Validation { .. }));
  assert!(err.to_string().contains("birthDate"));
}

// src/lib.rs

//! Uranai: order-to-delivery pipeline for an AI fortune-telling product.
//!
//! An order moves through four stages, each behind a trait seam so the
//! external collaborators can be stubbed or swapped:
//!  - Intake: payment webhooks and commerce polls become durable order
//!    records (idempotent per order id).
//!  - Generation: a text model produces the reading, with a per-call cost
//!    accumulated on the record.
//!  - Rendering: the reading becomes a paginated PDF artifact on disk.
//!  - Delivery: the artifact is mailed to the customer.
//!
//! The order store owns persistence and per-id write serialization; the
//! orchestrator owns every status transition and the uniform retry policy.

pub mod delivery;
pub mod error;
pub mod generator;
pub mod model;
pub mod pipeline;
pub mod renderer;
pub mod retry;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::error::{UranaiError, UranaiResult};
pub use crate::model::{Customer, ErrorInfo, FortuneType, OrderFilter, OrderRecord, OrderStatus};

pub use crate::store::{FileOrderStore, OrderStore};

pub use crate::generator::{CannedModel, Completion, FortuneGenerator, GeneratedFortune, Pricing, TextModel, Usage};
pub use crate::renderer::{DocumentEngine, DocumentRenderer, PdfEngine};
pub use crate::delivery::{DeliveryDispatcher, DeliveryReceipt, MailTransport, OutgoingMessage, SimulatedMailer};

pub use crate::pipeline::{BatchItem, BatchSummary, FormResponse, IntakeAdapter, OrderIntake, Orchestrator};
pub use crate::retry::RetryPolicy;

// uranai_core/src/store/mod.rs

//! Durable per-order state, keyed by order id.
//!
//! The store is the single source of truth for pipeline progress. It owns
//! persistence and per-id write serialization; everything else receives
//! records as values. The trait seam exists so the file-per-order layout can
//! be swapped for a database table without touching the orchestrator.

pub mod file;

pub use file::FileOrderStore;

use async_trait::async_trait;

use crate::error::UranaiResult;
use crate::model::{OrderFilter, OrderRecord};

/// Mutation applied inside `update` under the per-id lock.
pub type Mutator = Box<dyn FnOnce(&mut OrderRecord) + Send>;

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Fetches one record. `NotFound` when no record exists for the id.
  async fn get(&self, order_id: &str) -> UranaiResult<OrderRecord>;

  /// Persists a brand-new record. `AlreadyExists` on a duplicate id; callers
  /// expecting duplicate intake must use `upsert` instead.
  async fn create(&self, record: OrderRecord) -> UranaiResult<OrderRecord>;

  /// Idempotent creation: returns the existing record unchanged when one is
  /// already present. The bool is true when the record was created.
  async fn upsert(&self, record: OrderRecord) -> UranaiResult<(OrderRecord, bool)>;

  /// Atomic read-modify-write. Concurrent updates for the same id never
  /// interleave; `updated_at` is refreshed after the mutator runs. The write
  /// is durable before the updated record is returned.
  async fn update(&self, order_id: &str, mutator: Mutator) -> UranaiResult<OrderRecord>;

  /// All records matching the filter, most recently updated first. A re-list
  /// reflects the latest persisted state.
  async fn list(&self, filter: &OrderFilter) -> UranaiResult<Vec<OrderRecord>>;
}

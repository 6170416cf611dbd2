// uranai_core/src/store/file.rs

//! File-per-order JSON store: `<root>/<orderId>.json`.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{UranaiError, UranaiResult};
use crate::model::{OrderFilter, OrderRecord};
use crate::store::{Mutator, OrderStore};

/// Per-id async locks, handed out through a short synchronous registry
/// lookup.
///
/// The parking_lot guard protects only the HashMap and is dropped before any
/// await; the tokio mutex it hands out is the one held across the
/// read-modify-write cycle. Different ids use different locks, so orders
/// proceed independently.
struct KeyLocks {
  inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyLocks {
  fn new() -> Self {
    KeyLocks { inner: Mutex::new(HashMap::new()) }
  }

  fn for_key(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
    let mut map = self.inner.lock();
    map.entry(key.to_string()).or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))).clone()
  }
}

pub struct FileOrderStore {
  root: PathBuf,
  locks: KeyLocks,
}

impl FileOrderStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    FileOrderStore { root: root.into(), locks: KeyLocks::new() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn record_path(&self, order_id: &str) -> PathBuf {
    self.root.join(format!("{}.json", order_id))
  }

  async fn ensure_root(&self) -> UranaiResult<()> {
    tokio::fs::create_dir_all(&self.root).await?;
    Ok(())
  }

  async fn read_record(&self, path: &Path, order_id: &str) -> UranaiResult<OrderRecord> {
    let bytes = match tokio::fs::read(path).await {
      Ok(bytes) => bytes,
      Err(err) if err.kind() == ErrorKind::NotFound => {
        return Err(UranaiError::not_found(order_id));
      }
      Err(err) => return Err(err.into()),
    };
    serde_json::from_slice(&bytes)
      .map_err(|err| UranaiError::Storage { source: anyhow::Error::new(err).context(format!("corrupt record file for order '{}'", order_id)) })
  }

  /// Durable write: serialize to a sibling temp file, then rename. The
  /// rename is the commit point, so a crash mid-write never leaves a
  /// half-written document under the record's name.
  async fn write_record(&self, record: &OrderRecord) -> UranaiResult<()> {
    self.ensure_root().await?;
    let path = self.record_path(&record.order_id);
    let tmp = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(record)
      .map_err(|err| UranaiError::Storage { source: anyhow::Error::new(err) })?;
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, &path).await?;
    debug!(order_id = %record.order_id, status = %record.status, "order record persisted");
    Ok(())
  }
}

#[async_trait]
impl OrderStore for FileOrderStore {
  async fn get(&self, order_id: &str) -> UranaiResult<OrderRecord> {
    let path = self.record_path(order_id);
    self.read_record(&path, order_id).await
  }

  async fn create(&self, record: OrderRecord) -> UranaiResult<OrderRecord> {
    let lock = self.locks.for_key(&record.order_id);
    let _guard = lock.lock().await;

    let path = self.record_path(&record.order_id);
    match tokio::fs::metadata(&path).await {
      Ok(_) => return Err(UranaiError::AlreadyExists { order_id: record.order_id.clone() }),
      Err(err) if err.kind() == ErrorKind::NotFound => {}
      Err(err) => return Err(err.into()),
    }

    self.write_record(&record).await?;
    Ok(record)
  }

  async fn upsert(&self, record: OrderRecord) -> UranaiResult<(OrderRecord, bool)> {
    let lock = self.locks.for_key(&record.order_id);
    let _guard = lock.lock().await;

    let path = self.record_path(&record.order_id);
    match self.read_record(&path, &record.order_id).await {
      Ok(existing) => Ok((existing, false)),
      Err(UranaiError::NotFound { .. }) => {
        self.write_record(&record).await?;
        Ok((record, true))
      }
      Err(err) => Err(err),
    }
  }

  async fn update(&self, order_id: &str, mutator: Mutator) -> UranaiResult<OrderRecord> {
    let lock = self.locks.for_key(order_id);
    let _guard = lock.lock().await;

    let path = self.record_path(order_id);
    let mut record = self.read_record(&path, order_id).await?;
    mutator(&mut record);
    record.updated_at = Utc::now();
    self.write_record(&record).await?;
    Ok(record)
  }

  async fn list(&self, filter: &OrderFilter) -> UranaiResult<Vec<OrderRecord>> {
    self.ensure_root().await?;

    let mut records = Vec::new();
    let mut entries = tokio::fs::read_dir(&self.root).await?;
    while let Some(entry) = entries.next_entry().await? {
      let path = entry.path();
      if path.extension().map_or(true, |ext| ext != "json") {
        continue;
      }
      let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) => {
          warn!(path = %path.display(), error = %err, "skipping unreadable record file");
          continue;
        }
      };
      // A corrupt file must not poison the listing; it is skipped and logged
      // for an operator to inspect.
      match serde_json::from_slice::<OrderRecord>(&bytes) {
        Ok(record) => {
          if filter.matches(&record) {
            records.push(record);
          }
        }
        Err(err) => {
          warn!(path = %path.display(), error = %err, "skipping corrupt record file");
        }
      }
    }

    records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(records)
  }
}

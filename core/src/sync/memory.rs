// fastcart/src/sync/memory.rs

//! In-memory reference backend.
//!
//! Stands in for a real document store in tests and examples: per-user
//! containers keyed by dish id, live snapshot fan-out to subscribers,
//! and a fault-injection knob to simulate transient transport failures.

use crate::error::{CartError, CartResult};
use crate::model::RemoteCartRecord;
use crate::sync::backend::{CartBackend, SnapshotStream};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, trace};

#[derive(Default)]
pub struct MemoryBackend {
  // user id -> (dish id -> record); BTreeMap keeps inspection deterministic.
  carts: Mutex<HashMap<String, BTreeMap<String, RemoteCartRecord>>>,
  subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Vec<RemoteCartRecord>>>>>,
  // Remaining write operations that will fail with a simulated transport error.
  fail_remaining: AtomicU32,
}

impl MemoryBackend {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes the next `count` write operations (upsert/delete/clear) fail.
  pub fn fail_next_writes(&self, count: u32) {
    self.fail_remaining.store(count, Ordering::SeqCst);
  }

  /// Current records for a user, sorted by `added_at` ascending.
  pub fn records(&self, user_id: &str) -> Vec<RemoteCartRecord> {
    let carts = self.carts.lock();
    Self::snapshot_of(carts.get(user_id))
  }

  /// Pre-populates a user's container without notifying subscribers,
  /// as if the records were written by another device in the past.
  pub fn seed(&self, user_id: &str, records: Vec<RemoteCartRecord>) {
    let mut carts = self.carts.lock();
    let container = carts.entry(user_id.to_string()).or_default();
    for record in records {
      container.insert(record.dish_id.clone(), record);
    }
  }

  /// Writes records and fans the resulting snapshot out to subscribers,
  /// simulating a concurrent writer on another device.
  pub fn write_remote(&self, user_id: &str, records: Vec<RemoteCartRecord>) {
    self.seed(user_id, records);
    self.publish(user_id);
  }

  fn snapshot_of(container: Option<&BTreeMap<String, RemoteCartRecord>>) -> Vec<RemoteCartRecord> {
    let mut records: Vec<RemoteCartRecord> = container.map(|c| c.values().cloned().collect()).unwrap_or_default();
    records.sort_by(|a, b| a.added_at.cmp(&b.added_at).then_with(|| a.dish_id.cmp(&b.dish_id)));
    records
  }

  fn take_fault(&self, operation: &str) -> CartResult<()> {
    let mut remaining = self.fail_remaining.load(Ordering::SeqCst);
    while remaining > 0 {
      match self.fail_remaining.compare_exchange(
        remaining,
        remaining - 1,
        Ordering::SeqCst,
        Ordering::SeqCst,
      ) {
        Ok(_) => {
          debug!(operation, "memory backend injecting simulated transport failure");
          return Err(CartError::backend(
            operation,
            anyhow::anyhow!("simulated transport failure"),
          ));
        }
        Err(actual) => remaining = actual,
      }
    }
    Ok(())
  }

  fn publish(&self, user_id: &str) {
    let snapshot = {
      let carts = self.carts.lock();
      Self::snapshot_of(carts.get(user_id))
    };
    let mut subscribers = self.subscribers.lock();
    if let Some(senders) = subscribers.get_mut(user_id) {
      senders.retain(|tx| tx.send(snapshot.clone()).is_ok());
      trace!(user_id, listeners = senders.len(), records = snapshot.len(), "published snapshot");
    }
  }
}

#[async_trait]
impl CartBackend for MemoryBackend {
  async fn upsert(&self, user_id: &str, record: RemoteCartRecord) -> CartResult<()> {
    self.take_fault("upsert")?;
    {
      let mut carts = self.carts.lock();
      carts
        .entry(user_id.to_string())
        .or_default()
        .insert(record.dish_id.clone(), record);
    }
    self.publish(user_id);
    Ok(())
  }

  async fn delete(&self, user_id: &str, dish_id: &str) -> CartResult<()> {
    self.take_fault("delete")?;
    {
      let mut carts = self.carts.lock();
      if let Some(container) = carts.get_mut(user_id) {
        container.remove(dish_id);
      }
    }
    self.publish(user_id);
    Ok(())
  }

  async fn clear(&self, user_id: &str) -> CartResult<()> {
    self.take_fault("clear")?;
    {
      let mut carts = self.carts.lock();
      carts.remove(user_id);
    }
    self.publish(user_id);
    Ok(())
  }

  async fn subscribe(&self, user_id: &str) -> CartResult<SnapshotStream> {
    let (tx, rx) = mpsc::unbounded_channel();
    let initial = self.records(user_id);
    tx.send(initial)
      .map_err(|_| CartError::Subscription {
        user_id: user_id.to_string(),
        message: "subscriber channel closed before initial snapshot".to_string(),
      })?;
    self
      .subscribers
      .lock()
      .entry(user_id.to_string())
      .or_default()
      .push(tx);
    debug!(user_id, "memory backend subscription attached");

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
      rx.recv().await.map(|snapshot| (snapshot, rx))
    });
    Ok(Box::pin(stream))
  }
}

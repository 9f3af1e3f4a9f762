// fastcart/src/sync/service.rs

//! The cart service: owns the store, mirrors every local mutation to the
//! backend as a background write with bounded retry, and keeps the store
//! reconciled against the live snapshot subscription of whichever user
//! is currently signed in.
//!
//! Lifecycle is explicit: construct with injected dependencies, then
//! `start()` to bind the session and `stop()` to tear everything down.
//! Mutations remain fire-and-forget at the API edge; persistent write
//! failure is surfaced through the observable [`SyncStatus`] instead of
//! being silently swallowed.

use crate::config::SyncConfig;
use crate::error::CartResult;
use crate::model::{CartEntry, Dish};
use crate::store::{CartEvent, CartStore, ObserverId, RemoteEffect};
use crate::sync::backend::CartBackend;
use crate::sync::session::Session;
use futures_util::StreamExt;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};

/// Observable synchronization state, published through a watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
  /// No signed-in user; mutations stay local and writes are skipped.
  Unbound,
  /// Subscription active and no background writes outstanding.
  Synced,
  /// At least one background write is still in flight.
  Syncing { in_flight: usize },
  /// A write exhausted its retries; local and remote state may diverge
  /// until the next successful write or snapshot.
  Degraded { message: String },
}

/// Dish ids with an unacknowledged background write. While an id is
/// listed here, reconciliation lets the local collection win for it.
#[derive(Clone, Default)]
struct PendingWrites {
  inner: Arc<Mutex<HashMap<String, usize>>>,
}

impl PendingWrites {
  fn begin(&self, dish_ids: &[String]) {
    let mut inner = self.inner.lock();
    for id in dish_ids {
      *inner.entry(id.clone()).or_insert(0) += 1;
    }
  }

  fn end(&self, dish_ids: &[String]) {
    let mut inner = self.inner.lock();
    for id in dish_ids {
      if let Some(count) = inner.get_mut(id) {
        *count -= 1;
        if *count == 0 {
          inner.remove(id);
        }
      }
    }
  }

  fn snapshot(&self) -> HashSet<String> {
    self.inner.lock().keys().cloned().collect()
  }

  fn outstanding(&self) -> usize {
    self.inner.lock().values().sum()
  }

  fn reset(&self) {
    self.inner.lock().clear();
  }
}

pub struct CartService {
  store: CartStore,
  backend: Arc<dyn CartBackend>,
  session: Session,
  config: SyncConfig,
  pending: PendingWrites,
  status: Arc<watch::Sender<SyncStatus>>,
  // Bumped on every teardown; a background write dispatched under an
  // older generation must not publish status for the new binding.
  generation: Arc<AtomicU64>,
  binder: Mutex<Option<JoinHandle<()>>>,
}

impl CartService {
  pub fn new(backend: Arc<dyn CartBackend>, session: Session, config: SyncConfig) -> Self {
    let (status_tx, _status_rx) = watch::channel(SyncStatus::Unbound);
    CartService {
      store: CartStore::new(),
      backend,
      session,
      config,
      pending: PendingWrites::default(),
      status: Arc::new(status_tx),
      generation: Arc::new(AtomicU64::new(0)),
      binder: Mutex::new(None),
    }
  }

  /// Direct access to the underlying store, e.g. for the checkout
  /// consumer reading the entry list.
  pub fn store(&self) -> &CartStore {
    &self.store
  }

  // --- Lifecycle ---

  /// Spawns the session-binding task: attaches a snapshot subscription
  /// whenever a user id becomes available, rebinds on identity change,
  /// and tears down (clearing local state) on sign-out.
  ///
  /// Idempotent: a second call replaces the previous binding.
  #[instrument(name = "CartService::start", skip(self))]
  pub fn start(&self) {
    let mut binder = self.binder.lock();
    if let Some(handle) = binder.take() {
      warn!("cart service restarted; aborting previous session binding");
      handle.abort();
    }

    let store = self.store.clone();
    let backend = Arc::clone(&self.backend);
    let pending = self.pending.clone();
    let status = Arc::clone(&self.status);
    let generation = Arc::clone(&self.generation);
    let mut identity = self.session.watch();

    *binder = Some(tokio::spawn(async move {
      loop {
        let current = identity.borrow_and_update().clone();
        match current {
          Some(user_id) => {
            info!(user_id = %user_id, "binding cart subscription");
            tokio::select! {
              _ = Self::run_subscription(&store, &*backend, &pending, &status, &user_id) => {
                // Subscription ended on the backend side; stay bound and
                // wait for the next identity change.
                if identity.changed().await.is_err() {
                  break;
                }
              }
              changed = identity.changed() => {
                info!(user_id = %user_id, "identity changed; tearing down cart subscription");
                Self::unbind(&store, &pending, &status, &generation);
                if changed.is_err() {
                  break;
                }
              }
            }
          }
          None => {
            status.send_replace(SyncStatus::Unbound);
            if identity.changed().await.is_err() {
              break;
            }
          }
        }
      }
      debug!("session binding task finished");
    }));
  }

  /// Aborts the session binding and clears local state.
  #[instrument(name = "CartService::stop", skip(self))]
  pub fn stop(&self) {
    if let Some(handle) = self.binder.lock().take() {
      handle.abort();
    }
    Self::unbind(&self.store, &self.pending, &self.status, &self.generation);
    info!("cart service stopped");
  }

  // Local teardown only: no remote deletes are issued, the next bound
  // session starts from its own remote snapshot. Bumping the generation
  // invalidates status publishes from writes the old binding dispatched.
  fn unbind(
    store: &CartStore,
    pending: &PendingWrites,
    status: &watch::Sender<SyncStatus>,
    generation: &AtomicU64,
  ) {
    generation.fetch_add(1, Ordering::SeqCst);
    pending.reset();
    let _ = store.clear();
    status.send_replace(SyncStatus::Unbound);
  }

  async fn run_subscription(
    store: &CartStore,
    backend: &dyn CartBackend,
    pending: &PendingWrites,
    status: &watch::Sender<SyncStatus>,
    user_id: &str,
  ) {
    let mut snapshots = match backend.subscribe(user_id).await {
      Ok(stream) => stream,
      Err(err) => {
        error!(user_id, error = %err, "failed to attach cart subscription");
        status.send_replace(SyncStatus::Degraded {
          message: err.to_string(),
        });
        return;
      }
    };
    // Writes dispatched before the subscription attached are still in
    // flight; report them instead of claiming a settled state.
    let outstanding = pending.outstanding();
    if outstanding == 0 {
      status.send_replace(SyncStatus::Synced);
    } else {
      status.send_replace(SyncStatus::Syncing {
        in_flight: outstanding,
      });
    }

    while let Some(records) = snapshots.next().await {
      trace!(user_id, records = records.len(), "snapshot received");
      store.reconcile(records, &pending.snapshot());
    }
    warn!(user_id, "cart snapshot stream ended");
  }

  // --- Mutations (synchronous locally, mirrored in the background) ---

  #[instrument(name = "CartService::add_to_cart", skip(self, dish), fields(dish_id = %dish.id))]
  pub fn add_to_cart(&self, dish: Dish) {
    let effect = self.store.add_to_cart(dish);
    self.dispatch(effect);
  }

  #[instrument(name = "CartService::update_quantity", skip(self))]
  pub fn update_quantity(&self, dish_id: &str, quantity: i32) {
    let effect = self.store.update_quantity(dish_id, quantity);
    self.dispatch(effect);
  }

  pub fn increment_quantity(&self, dish_id: &str) {
    let effect = self.store.increment_quantity(dish_id);
    self.dispatch(effect);
  }

  pub fn decrement_quantity(&self, dish_id: &str) {
    let effect = self.store.decrement_quantity(dish_id);
    self.dispatch(effect);
  }

  #[instrument(name = "CartService::remove_from_cart", skip(self))]
  pub fn remove_from_cart(&self, dish_id: &str) {
    let effect = self.store.remove_from_cart(dish_id);
    self.dispatch(effect);
  }

  /// Empties the cart; used by the checkout consumer after an order is
  /// recorded.
  #[instrument(name = "CartService::clear_cart", skip(self))]
  pub fn clear_cart(&self) {
    let effect = self.store.clear();
    self.dispatch(effect);
  }

  // --- Queries ---

  pub fn total_price(&self) -> f64 {
    self.store.total_price()
  }

  pub fn total_items(&self) -> u32 {
    self.store.total_items()
  }

  pub fn item_quantity(&self, dish_id: &str) -> u32 {
    self.store.item_quantity(dish_id)
  }

  pub fn is_in_cart(&self, dish_id: &str) -> bool {
    self.store.is_in_cart(dish_id)
  }

  pub fn entries(&self) -> Vec<CartEntry> {
    self.store.entries()
  }

  // --- Observation ---

  pub fn observe(&self, observer: impl Fn(&CartEvent) + Send + Sync + 'static) -> ObserverId {
    self.store.observe(observer)
  }

  pub fn unobserve(&self, id: ObserverId) -> bool {
    self.store.unobserve(id)
  }

  pub fn sync_status(&self) -> SyncStatus {
    self.status.borrow().clone()
  }

  /// Watch channel for consumers that want to render sync state.
  pub fn watch_status(&self) -> watch::Receiver<SyncStatus> {
    self.status.subscribe()
  }

  // --- Background write dispatch ---

  fn dispatch(&self, effect: RemoteEffect) {
    let dish_ids: Vec<String> = match &effect {
      RemoteEffect::Upsert(record) => vec![record.dish_id.clone()],
      RemoteEffect::Delete { dish_id } => vec![dish_id.clone()],
      RemoteEffect::Clear { dish_ids } => dish_ids.clone(),
      RemoteEffect::None => return,
    };

    let Some(user_id) = self.session.current_user_id() else {
      trace!("no signed-in user; remote mirroring skipped");
      return;
    };

    self.pending.begin(&dish_ids);
    self.status.send_replace(SyncStatus::Syncing {
      in_flight: self.pending.outstanding(),
    });

    let backend = Arc::clone(&self.backend);
    let pending = self.pending.clone();
    let status = Arc::clone(&self.status);
    let generation = Arc::clone(&self.generation);
    let dispatched_generation = self.generation.load(Ordering::SeqCst);
    let config = self.config.clone();

    tokio::spawn(async move {
      let result = Self::write_with_retry(&*backend, &user_id, &effect, &config).await;
      pending.end(&dish_ids);
      // The session this write belonged to may have been torn down while
      // it was in flight; its outcome must not overwrite the status of
      // whatever binding is current now.
      if generation.load(Ordering::SeqCst) != dispatched_generation {
        debug!(user_id = %user_id, "write completed after session teardown; status publish skipped");
        if let Err(err) = result {
          warn!(user_id = %user_id, error = %err, "write for a torn-down session gave up after retries");
        }
        return;
      }
      match result {
        Ok(()) => {
          let outstanding = pending.outstanding();
          if outstanding == 0 {
            status.send_replace(SyncStatus::Synced);
          } else {
            status.send_replace(SyncStatus::Syncing {
              in_flight: outstanding,
            });
          }
        }
        Err(err) => {
          error!(user_id = %user_id, error = %err, "cart write gave up after retries");
          status.send_replace(SyncStatus::Degraded {
            message: err.to_string(),
          });
        }
      }
    });
  }

  async fn write_with_retry(
    backend: &dyn CartBackend,
    user_id: &str,
    effect: &RemoteEffect,
    config: &SyncConfig,
  ) -> CartResult<()> {
    let mut attempt: u32 = 0;
    loop {
      let result = match effect {
        RemoteEffect::Upsert(record) => backend.upsert(user_id, record.clone()).await,
        RemoteEffect::Delete { dish_id } => backend.delete(user_id, dish_id).await,
        RemoteEffect::Clear { .. } => backend.clear(user_id).await,
        RemoteEffect::None => Ok(()),
      };
      match result {
        Ok(()) => return Ok(()),
        Err(err) if attempt < config.max_write_retries => {
          attempt += 1;
          let delay = config.retry_backoff * 2u32.saturating_pow(attempt - 1);
          warn!(
            user_id,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "cart write failed; retrying"
          );
          tokio::time::sleep(delay).await;
        }
        Err(err) => return Err(err),
      }
    }
  }
}

impl Drop for CartService {
  fn drop(&mut self) {
    if let Some(handle) = self.binder.lock().take() {
      handle.abort();
    }
  }
}

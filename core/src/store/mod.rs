// fastcart/src/store/mod.rs

//! The cart store: canonical in-memory ordered collection of cart
//! entries, the single source of truth the UI observes.
//!
//! All operations are synchronous on the in-memory collection. Mutations
//! return a [`RemoteEffect`] describing the write the sync layer must
//! mirror to the backend; the store itself never performs I/O.
//!
//! IMPORTANT: internal lock guards are blocking and are never held while
//! observers run or across `.await` points in the sync layer.

pub mod observer;

pub use observer::{CartEvent, CartObserver, ObserverId};

use crate::model::{CartEntry, Dish, RemoteCartRecord};
use crate::pricing;
use observer::ObserverSet;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// The remote mirroring a mutation requires. Dispatched by the owning
/// service as a background write; `None` means the mutation had no
/// observable effect (e.g. removing an absent dish).
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEffect {
  Upsert(RemoteCartRecord),
  Delete { dish_id: String },
  /// Bulk delete of the user's whole container. Carries the ids that
  /// were present locally so in-flight suppression can cover them.
  Clear { dish_ids: Vec<String> },
  None,
}

/// Shared, cheaply cloneable handle to the cart collection.
///
/// The collection is guarded by a `parking_lot::RwLock`; the foreground
/// context mutates it through the operations below, the sync layer only
/// ever calls [`CartStore::reconcile`].
#[derive(Clone)]
pub struct CartStore {
  entries: Arc<RwLock<Vec<CartEntry>>>,
  observers: Arc<Mutex<ObserverSet>>,
}

impl Default for CartStore {
  fn default() -> Self {
    Self::new()
  }
}

impl CartStore {
  pub fn new() -> Self {
    CartStore {
      entries: Arc::new(RwLock::new(Vec::new())),
      observers: Arc::new(Mutex::new(ObserverSet::default())),
    }
  }

  // --- Mutations ---

  /// Adds a dish: an existing entry gets its quantity incremented by 1,
  /// otherwise a new entry with quantity 1 and `added_at = now` is
  /// appended. Repeated calls accumulate quantity, never duplicate
  /// entries.
  pub fn add_to_cart(&self, dish: Dish) -> RemoteEffect {
    let (effect, event) = {
      let mut entries = self.entries.write();
      match entries.iter_mut().find(|e| e.dish.id == dish.id) {
        Some(entry) => {
          entry.quantity += 1;
          entry.version += 1;
          debug!(dish_id = %dish.id, quantity = entry.quantity, "incremented existing cart entry");
          let record = RemoteCartRecord::from_entry(entry);
          let event = CartEvent::EntryUpserted {
            dish_id: dish.id,
            quantity: record.quantity,
          };
          (RemoteEffect::Upsert(record), event)
        }
        None => {
          let entry = CartEntry::new(dish);
          debug!(dish_id = %entry.dish.id, "inserted new cart entry");
          let record = RemoteCartRecord::from_entry(&entry);
          let event = CartEvent::EntryUpserted {
            dish_id: entry.dish.id.clone(),
            quantity: 1,
          };
          entries.push(entry);
          (RemoteEffect::Upsert(record), event)
        }
      }
    };
    self.notify(&event);
    effect
  }

  /// Sets an entry's quantity. A quantity of 0 or less removes the entry
  /// instead, preserving the `quantity >= 1` invariant. No-op when the
  /// dish is not in the cart.
  pub fn update_quantity(&self, dish_id: &str, quantity: i32) -> RemoteEffect {
    if quantity <= 0 {
      return self.remove_from_cart(dish_id);
    }
    let (effect, event) = {
      let mut entries = self.entries.write();
      match entries.iter_mut().find(|e| e.dish.id == dish_id) {
        Some(entry) => {
          entry.quantity = quantity as u32;
          entry.version += 1;
          debug!(dish_id, quantity = entry.quantity, "updated cart entry quantity");
          let record = RemoteCartRecord::from_entry(entry);
          let event = CartEvent::EntryUpserted {
            dish_id: dish_id.to_string(),
            quantity: record.quantity,
          };
          (RemoteEffect::Upsert(record), event)
        }
        None => {
          trace!(dish_id, "update_quantity on absent dish ignored");
          return RemoteEffect::None;
        }
      }
    };
    self.notify(&event);
    effect
  }

  /// Adjusts quantity by +1. No-op when absent.
  pub fn increment_quantity(&self, dish_id: &str) -> RemoteEffect {
    let current = self.item_quantity(dish_id);
    if current == 0 {
      return RemoteEffect::None;
    }
    self.update_quantity(dish_id, current as i32 + 1)
  }

  /// Adjusts quantity by -1; decrementing from 1 removes the entry, so a
  /// quantity of 0 is never observable.
  pub fn decrement_quantity(&self, dish_id: &str) -> RemoteEffect {
    let current = self.item_quantity(dish_id);
    if current == 0 {
      return RemoteEffect::None;
    }
    self.update_quantity(dish_id, current as i32 - 1)
  }

  /// Deletes the entry if present; safe to call on an absent id.
  pub fn remove_from_cart(&self, dish_id: &str) -> RemoteEffect {
    let removed = {
      let mut entries = self.entries.write();
      let before = entries.len();
      entries.retain(|e| e.dish.id != dish_id);
      entries.len() != before
    };
    if !removed {
      trace!(dish_id, "remove_from_cart on absent dish ignored");
      return RemoteEffect::None;
    }
    debug!(dish_id, "removed cart entry");
    self.notify(&CartEvent::EntryRemoved {
      dish_id: dish_id.to_string(),
    });
    RemoteEffect::Delete {
      dish_id: dish_id.to_string(),
    }
  }

  /// Empties the whole collection.
  pub fn clear(&self) -> RemoteEffect {
    let dish_ids: Vec<String> = {
      let mut entries = self.entries.write();
      let ids = entries.iter().map(|e| e.dish.id.clone()).collect();
      entries.clear();
      ids
    };
    debug!(removed = dish_ids.len(), "cleared cart");
    self.notify(&CartEvent::Cleared);
    RemoteEffect::Clear { dish_ids }
  }

  // --- Reconciliation (sync layer only) ---

  /// Replaces the collection with the contents of a remote snapshot,
  /// denormalized and sorted by `added_at` ascending.
  ///
  /// Two guards keep stale remote data from clobbering optimistic local
  /// state:
  /// - an id listed in `in_flight` has an unacknowledged local write;
  ///   whatever the local collection says for that id wins (present
  ///   entry kept as-is, absent entry stays absent);
  /// - otherwise a local entry is only replaced when the incoming
  ///   record's version is at least the local one.
  ///
  /// An entry whose write gave up permanently (no longer in flight,
  /// never persisted) yields to the next snapshot: the remote side wins
  /// once nothing is outstanding, so the entry disappears from the
  /// collection. Consumers learn of the divergence through the degraded
  /// sync status and of the disappearance through the `Reconciled`
  /// event.
  pub fn reconcile(&self, records: Vec<RemoteCartRecord>, in_flight: &HashSet<String>) {
    let count = {
      let mut entries = self.entries.write();
      let locals: Vec<CartEntry> = std::mem::take(&mut *entries);

      let mut next: Vec<CartEntry> = Vec::with_capacity(records.len());
      for record in records {
        let local = locals.iter().find(|e| e.dish.id == record.dish_id);
        if in_flight.contains(&record.dish_id) {
          // Local write pending: keep local state, or drop the record
          // entirely when the pending write is a delete.
          if let Some(entry) = local {
            next.push(entry.clone());
          }
          continue;
        }
        match local {
          Some(entry) if entry.version > record.version => {
            trace!(dish_id = %record.dish_id, local_version = entry.version, remote_version = record.version,
                   "stale remote record ignored during reconciliation");
            next.push(entry.clone());
          }
          _ => next.push(record.into_entry()),
        }
      }

      // Local entries with a pending write that the snapshot has not
      // caught up to yet survive the replace.
      for entry in locals {
        if in_flight.contains(&entry.dish.id) && !next.iter().any(|e| e.dish.id == entry.dish.id) {
          next.push(entry);
        }
      }

      next.sort_by(|a, b| a.added_at.cmp(&b.added_at).then_with(|| a.dish.id.cmp(&b.dish.id)));
      *entries = next;
      entries.len()
    };
    debug!(entries = count, "reconciled cart from remote snapshot");
    self.notify(&CartEvent::Reconciled { entries: count });
  }

  // --- Queries (pure reads) ---

  pub fn total_price(&self) -> f64 {
    pricing::total_price(&self.entries.read())
  }

  pub fn total_items(&self) -> u32 {
    pricing::total_quantity(&self.entries.read())
  }

  /// Quantity for a dish; 0 when absent.
  pub fn item_quantity(&self, dish_id: &str) -> u32 {
    self
      .entries
      .read()
      .iter()
      .find(|e| e.dish.id == dish_id)
      .map(|e| e.quantity)
      .unwrap_or(0)
  }

  pub fn is_in_cart(&self, dish_id: &str) -> bool {
    self.entries.read().iter().any(|e| e.dish.id == dish_id)
  }

  /// Snapshot of the current collection in display order.
  pub fn entries(&self) -> Vec<CartEntry> {
    self.entries.read().clone()
  }

  pub fn len(&self) -> usize {
    self.entries.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.read().is_empty()
  }

  // --- Observers ---

  /// Registers an observer invoked after every mutation and every
  /// reconciliation replace.
  pub fn observe(&self, observer: impl Fn(&CartEvent) + Send + Sync + 'static) -> ObserverId {
    self.observers.lock().add(Arc::new(observer))
  }

  /// Unregisters; returns false when the id was already gone.
  pub fn unobserve(&self, id: ObserverId) -> bool {
    self.observers.lock().remove(id)
  }

  pub fn observer_count(&self) -> usize {
    self.observers.lock().len()
  }

  // Callbacks run outside both locks so they may re-enter queries.
  fn notify(&self, event: &CartEvent) {
    let callbacks = self.observers.lock().callbacks();
    for callback in callbacks {
      callback(event);
    }
  }
}

// fastcart/src/store/observer.rs

//! Explicit observer list for cart consumers (badges, totals, screens).
//!
//! Every mutation and every reconciliation replace pushes a `CartEvent`
//! to all registered observers, so consumers never need to re-poll.

use std::sync::Arc;

/// What changed in the cart collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
  /// An entry was inserted or its quantity changed.
  EntryUpserted { dish_id: String, quantity: u32 },
  /// An entry left the collection (explicit removal or quantity floor).
  EntryRemoved { dish_id: String },
  /// The whole collection was emptied.
  Cleared,
  /// A remote snapshot replaced the collection.
  Reconciled { entries: usize },
}

/// Callback invoked outside the store's locks; it may freely call back
/// into the store's query operations.
pub type CartObserver = Arc<dyn Fn(&CartEvent) + Send + Sync + 'static>;

/// Handle returned by `CartStore::observe`, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Registry of live observers. Held behind a `parking_lot::Mutex` by the
/// store; notification clones the callback list out of the lock first.
#[derive(Default)]
pub(crate) struct ObserverSet {
  next_id: u64,
  observers: Vec<(ObserverId, CartObserver)>,
}

impl ObserverSet {
  pub(crate) fn add(&mut self, observer: CartObserver) -> ObserverId {
    self.next_id += 1;
    let id = ObserverId(self.next_id);
    self.observers.push((id, observer));
    id
  }

  pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
    let before = self.observers.len();
    self.observers.retain(|(oid, _)| *oid != id);
    self.observers.len() != before
  }

  pub(crate) fn callbacks(&self) -> Vec<CartObserver> {
    self.observers.iter().map(|(_, o)| Arc::clone(o)).collect()
  }

  pub(crate) fn len(&self) -> usize {
    self.observers.len()
  }
}

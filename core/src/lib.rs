// src/lib.rs

//! Fastcart: a reactive shopping-cart engine with remote synchronization.
//!
//! The engine keeps an in-memory, observable collection of "items the
//! user intends to buy" consistent with a per-user remote collection,
//! under concurrent local mutation and asynchronous remote writes/reads:
//!  - Synchronous, optimistic cart mutations with an explicit observer list.
//!  - A pure price calculator (percentage discounts, totals, lenient parsing).
//!  - A backend-agnostic sync adapter: live snapshot subscription in,
//!    background upsert/delete/clear out, with bounded retry and an
//!    observable sync status.
//!  - Session binding with an explicit start/stop lifecycle: the
//!    subscription follows the signed-in identity and local state is
//!    cleared on sign-out.

pub mod config;
pub mod error;
pub mod model;
pub mod pricing;
pub mod store;
pub mod sync;

// --- Re-exports for the Public API ---

pub use crate::config::SyncConfig;
pub use crate::error::{CartError, CartResult};
pub use crate::model::{CartEntry, Dish, RemoteCartRecord};
pub use crate::store::{CartEvent, CartStore, ObserverId, RemoteEffect};
pub use crate::sync::{CartBackend, CartService, MemoryBackend, Session, SnapshotStream, SyncStatus};

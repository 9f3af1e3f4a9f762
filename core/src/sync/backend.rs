// fastcart/src/sync/backend.rs

//! Boundary to the remote per-user cart container.
//!
//! The engine is backend-agnostic: anything that can upsert, delete and
//! clear records keyed by dish id inside a per-user container, and hand
//! out a live snapshot stream, can drive the sync layer.

use crate::error::CartResult;
use crate::model::RemoteCartRecord;
use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Live feed of full snapshots of one user's cart container. Each item
/// is the complete current record set; the stream ends when the
/// subscription is torn down on the backend side.
pub type SnapshotStream = BoxStream<'static, Vec<RemoteCartRecord>>;

/// Asynchronous client for the remote cart store.
///
/// Record identity is the dish id within the user's container, which is
/// what gives `upsert` its semantics. Implementations are expected to be
/// cheap to share behind an `Arc`.
#[async_trait]
pub trait CartBackend: Send + Sync {
  /// Creates or replaces the record for `record.dish_id`.
  async fn upsert(&self, user_id: &str, record: RemoteCartRecord) -> CartResult<()>;

  /// Deletes one record; deleting an absent record is not an error.
  async fn delete(&self, user_id: &str, dish_id: &str) -> CartResult<()>;

  /// Deletes the user's entire container.
  async fn clear(&self, user_id: &str) -> CartResult<()>;

  /// Attaches a live subscription. The returned stream yields the
  /// current snapshot immediately, then one snapshot per remote change.
  async fn subscribe(&self, user_id: &str) -> CartResult<SnapshotStream>;
}

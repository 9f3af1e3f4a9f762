// fastcart/src/sync/mod.rs

//! Remote synchronization: backend boundary, session binding and the
//! cart service that ties store, backend and session together.

pub mod backend;
pub mod memory;
pub mod service;
pub mod session;

pub use backend::{CartBackend, SnapshotStream};
pub use memory::MemoryBackend;
pub use service::{CartService, SyncStatus};
pub use session::Session;

// fastcart/src/model/mod.rs

//! Data structures for the cart engine: catalog snapshots, in-memory
//! entries and the persisted per-user record shape.

pub mod dish;
pub mod entry;
pub mod record;

pub use dish::Dish;
pub use entry::CartEntry;
pub use record::RemoteCartRecord;

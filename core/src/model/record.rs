// fastcart/src/model/record.rs

use crate::model::{CartEntry, Dish};
use crate::pricing;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted representation of one cart entry: one document per dish per
/// user, keyed by `dish_id` inside the user's container. That key is what
/// makes "add existing dish" an upsert rather than a duplicate insert.
///
/// Field names on the wire are camelCase, matching the backend's document
/// layout. `discount` stays a string on the wire (the catalog form's raw
/// value); `price` is numeric, already parsed leniently at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartRecord {
  pub dish_id: String,
  pub name: String,
  pub price: f64,
  pub photo_url: String,
  pub quantity: u32,
  pub added_at: DateTime<Utc>,
  pub discount: String,
  pub restaurant_id: String,
  /// Per-entry mutation counter carried through the backend so stale
  /// snapshots can be detected during reconciliation. Absent in records
  /// written by older clients; defaults to 0 (always considered stale
  /// relative to any local mutation).
  #[serde(default)]
  pub version: u64,
}

impl RemoteCartRecord {
  /// Flattens a local entry into its persisted shape.
  pub fn from_entry(entry: &CartEntry) -> Self {
    RemoteCartRecord {
      dish_id: entry.dish.id.clone(),
      name: entry.dish.name.clone(),
      price: pricing::parse_numeric(&entry.dish.price),
      photo_url: entry.dish.photo_url.clone(),
      quantity: entry.quantity,
      added_at: entry.added_at,
      discount: entry.dish.discount.clone().unwrap_or_default(),
      restaurant_id: entry.dish.restaurant_id.clone(),
      version: entry.version,
    }
  }

  /// Denormalizes a persisted record back into an in-memory entry.
  ///
  /// A record with `quantity` 0 (malformed by the store's invariant) is
  /// still materialized with quantity 1 so the floor invariant holds
  /// locally whatever the backend returned.
  pub fn into_entry(self) -> CartEntry {
    let dish = Dish {
      id: self.dish_id,
      name: self.name,
      price: self.price.to_string(),
      photo_url: self.photo_url,
      discount: if self.discount.is_empty() { None } else { Some(self.discount) },
      restaurant_id: self.restaurant_id,
    };
    CartEntry {
      dish,
      quantity: self.quantity.max(1),
      added_at: self.added_at,
      version: self.version,
    }
  }
}

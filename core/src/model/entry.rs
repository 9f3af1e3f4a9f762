// fastcart/src/model/entry.rs

use crate::model::Dish;
use crate::pricing;
use chrono::{DateTime, Utc};

/// One dish in the local cart collection.
///
/// Invariants enforced by the store:
/// - `quantity >= 1` always; an operation that would drop it below 1
///   removes the entry instead.
/// - at most one entry per distinct `dish.id`.
#[derive(Debug, Clone, PartialEq)]
pub struct CartEntry {
  pub dish: Dish,
  pub quantity: u32,
  /// Timestamp of first insertion; used only for stable oldest-first
  /// display ordering.
  pub added_at: DateTime<Utc>,
  /// Monotonic per-entry mutation counter. Reconciliation only accepts a
  /// remote record over this entry when the record's version is at least
  /// as new.
  pub version: u64,
}

impl CartEntry {
  pub fn new(dish: Dish) -> Self {
    CartEntry {
      dish,
      quantity: 1,
      added_at: Utc::now(),
      version: 1,
    }
  }

  /// Unit price after the dish's percentage discount, if any.
  pub fn effective_unit_price(&self) -> f64 {
    let base = pricing::parse_numeric(&self.dish.price);
    let discount = pricing::parse_optional_numeric(self.dish.discount.as_deref());
    pricing::effective_unit_price(base, discount)
  }

  /// Effective unit price times quantity.
  pub fn line_total(&self) -> f64 {
    self.effective_unit_price() * self.quantity as f64
  }
}

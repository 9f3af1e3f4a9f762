// fastcart/src/pricing.rs

//! Pure price derivations over cart entries.
//!
//! Catalog forms deliver price and discount as free-text decimal strings;
//! anything that does not parse is treated as 0 rather than raised as an
//! error, so totals are always defined for any well-formed entry list.

use crate::model::CartEntry;

/// Lenient numeric parse: trimmed decimal string, malformed input -> 0.
pub fn parse_numeric(raw: &str) -> f64 {
  raw.trim().parse::<f64>().unwrap_or(0.0)
}

/// Same leniency for optional fields (e.g. a dish with no discount set).
pub fn parse_optional_numeric(raw: Option<&str>) -> f64 {
  raw.map(parse_numeric).unwrap_or(0.0)
}

/// A dish's unit price after applying its percentage discount, if any.
///
/// `effective_unit_price(100.0, 20.0) == 80.0`; a zero or negative
/// discount leaves the base price untouched.
pub fn effective_unit_price(base_price: f64, discount_percent: f64) -> f64 {
  if discount_percent > 0.0 {
    base_price * (1.0 - discount_percent / 100.0)
  } else {
    base_price
  }
}

/// Sum of effective unit price times quantity across all entries.
pub fn total_price(entries: &[CartEntry]) -> f64 {
  entries.iter().map(|e| e.effective_unit_price() * e.quantity as f64).sum()
}

/// Sum of quantities across all entries.
pub fn total_quantity(entries: &[CartEntry]) -> u32 {
  entries.iter().map(|e| e.quantity).sum()
}

// fastcart/src/model/dish.rs

use serde::{Deserialize, Serialize};

/// Immutable catalog snapshot taken at the moment a dish is added to the
/// cart. The cart never re-fetches or revalidates it afterwards.
///
/// Price and discount arrive as decimal-bearing strings straight from the
/// catalog form; `pricing` parses them leniently (malformed -> 0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dish {
  pub id: String,
  pub name: String,
  pub price: String,
  pub photo_url: String,
  /// Percentage discount, e.g. "10" for 10% off. `None` means no discount.
  pub discount: Option<String>,
  /// Owning seller.
  pub restaurant_id: String,
}

// fastcart/examples/basic_cart.rs

use fastcart::{CartService, Dish, MemoryBackend, Session, SyncConfig, SyncStatus};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

// 1. Build a dish snapshot the way the catalog would hand it over:
//    price and discount are raw decimal strings from the catalog form.
fn margherita() -> Dish {
  Dish {
    id: "margherita".to_string(),
    name: "Pizza Margherita".to_string(),
    price: "1000".to_string(),
    photo_url: "https://cdn.example.com/margherita.jpg".to_string(),
    discount: Some("10".to_string()),
    restaurant_id: "resto-42".to_string(),
  }
}

#[tokio::main]
async fn main() {
  // Initialize tracing (optional, for demonstration)
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Cart Example ---");

  // 2. Wire the service with injected dependencies: an in-memory backend
  //    standing in for the remote document store, and a session handle
  //    supplied by the auth collaborator.
  let backend = Arc::new(MemoryBackend::new());
  let session = Session::new();
  let service = CartService::new(backend.clone(), session.clone(), SyncConfig::default());

  // 3. Observe the cart: consumers get pushed every mutation and every
  //    reconciliation instead of re-polling.
  service.observe(|event| info!(?event, "cart changed"));

  // 4. Bind the session lifecycle, then sign in.
  service.start();
  session.sign_in("user-1");

  // 5. Mutate: synchronous locally, mirrored to the backend in the
  //    background.
  service.add_to_cart(margherita());
  service.add_to_cart(margherita());
  info!(
    quantity = service.item_quantity("margherita"),
    total_price = service.total_price(), // 2 x 1000 with 10% off = 1800
    total_items = service.total_items(),
    "cart after two adds"
  );

  // Give the background writes a moment to land, then inspect the mirror.
  tokio::time::sleep(Duration::from_millis(100)).await;
  info!(status = ?service.sync_status(), remote_records = backend.records("user-1").len(), "sync state");
  assert_eq!(service.sync_status(), SyncStatus::Synced);

  // 6. Checkout consumer: read the entry list and totals once, then clear.
  for entry in service.entries() {
    info!(dish = %entry.dish.name, quantity = entry.quantity, line_total = entry.line_total(), "order line");
  }
  service.clear_cart();
  tokio::time::sleep(Duration::from_millis(100)).await;
  info!(remote_records = backend.records("user-1").len(), "after clear");

  // 7. Tear down explicitly.
  service.stop();
  info!("--- Example finished ---");
}

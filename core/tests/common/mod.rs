// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use fastcart::{CartService, Dish, MemoryBackend, RemoteCartRecord, Session, SyncConfig};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

// --- Fixtures ---

pub fn dish(id: &str, name: &str, price: &str, discount: Option<&str>) -> Dish {
  Dish {
    id: id.to_string(),
    name: name.to_string(),
    price: price.to_string(),
    photo_url: format!("https://cdn.example.com/{}.jpg", id),
    discount: discount.map(str::to_string),
    restaurant_id: "resto-1".to_string(),
  }
}

/// A persisted record as another device would have written it. `age_secs`
/// pushes `added_at` into the past so ordering between records is stable.
pub fn record(dish_id: &str, name: &str, price: f64, quantity: u32, age_secs: i64) -> RemoteCartRecord {
  RemoteCartRecord {
    dish_id: dish_id.to_string(),
    name: name.to_string(),
    price,
    photo_url: format!("https://cdn.example.com/{}.jpg", dish_id),
    quantity,
    added_at: Utc::now() - ChronoDuration::seconds(age_secs),
    discount: String::new(),
    restaurant_id: "resto-1".to_string(),
    version: 1,
  }
}

/// Record with a fixed timestamp, for deterministic ordering assertions.
pub fn record_at(dish_id: &str, quantity: u32, epoch_secs: i64) -> RemoteCartRecord {
  RemoteCartRecord {
    added_at: Utc.timestamp_opt(epoch_secs, 0).unwrap(),
    ..record(dish_id, dish_id, 100.0, quantity, 0)
  }
}

// --- Service harness ---

/// Fast retry settings so failure tests finish quickly.
pub fn test_config() -> SyncConfig {
  SyncConfig {
    max_write_retries: 3,
    retry_backoff: Duration::from_millis(10),
  }
}

pub struct Harness {
  pub backend: Arc<MemoryBackend>,
  pub session: Session,
  pub service: CartService,
}

/// Backend + session + started service, ready for sync tests.
pub fn harness() -> Harness {
  setup_tracing();
  let backend = Arc::new(MemoryBackend::new());
  let session = Session::new();
  let service = CartService::new(backend.clone(), session.clone(), test_config());
  service.start();
  Harness {
    backend,
    session,
    service,
  }
}

/// Polls `condition` until it holds or the deadline passes.
pub async fn wait_until<F, Fut>(what: &str, condition: F)
where
  F: Fn() -> Fut,
  Fut: Future<Output = bool>,
{
  let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
  loop {
    if condition().await {
      return;
    }
    if tokio::time::Instant::now() >= deadline {
      panic!("timed out waiting for: {}", what);
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

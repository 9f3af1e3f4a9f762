// tests/sync_tests.rs
mod common;

use common::{dish, harness, record, wait_until};
use fastcart::SyncStatus;

#[tokio::test]
async fn test_local_mutation_is_mirrored_to_backend() {
  let h = harness();
  h.session.sign_in("user-a");

  h.service.add_to_cart(dish("pizza", "Pizza", "450", None));
  assert_eq!(h.service.item_quantity("pizza"), 1, "local state is optimistic");

  wait_until("backend upsert to land", || async {
    h.backend.records("user-a").iter().any(|r| r.dish_id == "pizza" && r.quantity == 1)
  })
  .await;
}

#[tokio::test]
async fn test_rapid_mutations_converge_on_backend() {
  let h = harness();
  h.session.sign_in("user-a");

  let pizza = dish("pizza", "Pizza", "450", None);
  h.service.add_to_cart(pizza.clone());
  h.service.add_to_cart(pizza.clone());
  h.service.add_to_cart(pizza);
  assert_eq!(h.service.item_quantity("pizza"), 3);

  wait_until("backend to converge on quantity 3", || async {
    h.backend.records("user-a").iter().any(|r| r.dish_id == "pizza" && r.quantity == 3)
  })
  .await;
  wait_until("status to settle on Synced", || async {
    h.service.sync_status() == SyncStatus::Synced
  })
  .await;
  // The echo snapshots must not have disturbed the optimistic state.
  assert_eq!(h.service.item_quantity("pizza"), 3);
}

#[tokio::test]
async fn test_sign_in_reconciles_seeded_remote_cart() {
  let h = harness();
  h.backend.seed(
    "user-a",
    vec![
      record("newer", "Newer", 100.0, 2, 10),
      record("older", "Older", 50.0, 1, 60),
    ],
  );

  h.session.sign_in("user-a");
  wait_until("seeded records to reconcile", || async { h.service.entries().len() == 2 }).await;

  let entries = h.service.entries();
  assert_eq!(entries[0].dish.id, "older", "oldest entry first");
  assert_eq!(entries[1].dish.id, "newer");
  assert_eq!(h.service.total_items(), 3);
}

#[tokio::test]
async fn test_remote_writer_updates_local_cart() {
  let h = harness();
  h.session.sign_in("user-a");
  wait_until("subscription to attach", || async {
    h.service.sync_status() == SyncStatus::Synced
  })
  .await;

  // Another device writes to the same container.
  h.backend.write_remote("user-a", vec![record("soup", "Soup", 200.0, 2, 5)]);

  wait_until("remote write to reconcile", || async { h.service.is_in_cart("soup") }).await;
  assert_eq!(h.service.item_quantity("soup"), 2);
}

#[tokio::test]
async fn test_sign_out_clears_local_state_without_remote_deletes() {
  let h = harness();
  h.session.sign_in("user-a");
  h.service.add_to_cart(dish("pizza", "Pizza", "450", None));
  wait_until("write to land", || async { !h.backend.records("user-a").is_empty() }).await;

  h.session.sign_out();
  wait_until("local state to clear on sign-out", || async {
    h.service.entries().is_empty() && h.service.sync_status() == SyncStatus::Unbound
  })
  .await;

  // The remote container is untouched; a later session restores it.
  assert_eq!(h.backend.records("user-a").len(), 1);
  h.session.sign_in("user-a");
  wait_until("rebind to restore the cart", || async { h.service.is_in_cart("pizza") }).await;
}

#[tokio::test]
async fn test_fresh_session_never_sees_previous_users_cart() {
  let h = harness();
  h.session.sign_in("user-a");
  h.service.add_to_cart(dish("pizza", "Pizza", "450", None));
  wait_until("user-a write to land", || async { !h.backend.records("user-a").is_empty() }).await;

  h.session.sign_in("user-b");
  // Bound and synced for user-b means the previous user's entries are gone:
  // teardown cleared them and user-b's snapshot is empty.
  wait_until("user-b session to bind with an empty cart", || async {
    h.service.sync_status() == SyncStatus::Synced && h.service.entries().is_empty()
  })
  .await;
  assert!(!h.backend.records("user-a").is_empty(), "user-a's remote container is untouched");
}

#[tokio::test]
async fn test_transient_write_failures_are_retried() {
  let h = harness();
  h.session.sign_in("user-a");

  // First two attempts fail; retries (3 allowed) must still land the write.
  h.backend.fail_next_writes(2);
  h.service.add_to_cart(dish("pizza", "Pizza", "450", None));

  wait_until("write to land after retries", || async {
    !h.backend.records("user-a").is_empty()
  })
  .await;
  wait_until("status to recover to Synced", || async {
    h.service.sync_status() == SyncStatus::Synced
  })
  .await;
}

#[tokio::test]
async fn test_exhausted_retries_surface_as_degraded() {
  let h = harness();
  h.session.sign_in("user-a");

  // More failures than one dispatch can retry through.
  h.backend.fail_next_writes(10);
  h.service.add_to_cart(dish("pizza", "Pizza", "450", None));

  wait_until("status to degrade", || async {
    matches!(h.service.sync_status(), SyncStatus::Degraded { .. })
  })
  .await;
  // The optimistic local state is kept; only the mirror is behind.
  assert_eq!(h.service.item_quantity("pizza"), 1);
  assert!(h.backend.records("user-a").is_empty());
}

#[tokio::test]
async fn test_write_completing_after_sign_out_keeps_status_unbound() {
  let h = harness();
  h.session.sign_in("user-a");

  // The first attempt fails, parking the write in its retry backoff;
  // the user signs out while it is still in flight.
  h.backend.fail_next_writes(1);
  h.service.add_to_cart(dish("pizza", "Pizza", "450", None));
  h.session.sign_out();

  wait_until("sign-out teardown", || async {
    h.service.sync_status() == SyncStatus::Unbound
  })
  .await;

  // The retry eventually lands on the backend, but its outcome belongs
  // to the torn-down session and must not overwrite Unbound.
  wait_until("the retried write to land", || async {
    !h.backend.records("user-a").is_empty()
  })
  .await;
  tokio::time::sleep(std::time::Duration::from_millis(50)).await;
  assert_eq!(h.service.sync_status(), SyncStatus::Unbound);
}

#[tokio::test]
async fn test_entry_with_permanently_failed_write_yields_to_next_snapshot() {
  let h = harness();
  h.session.sign_in("user-a");

  // Exhaust every retry for the upsert: the entry stays local-only and
  // the divergence is surfaced as Degraded.
  h.backend.fail_next_writes(10);
  h.service.add_to_cart(dish("pizza", "Pizza", "450", None));
  wait_until("status to degrade", || async {
    matches!(h.service.sync_status(), SyncStatus::Degraded { .. })
  })
  .await;
  assert!(h.service.is_in_cart("pizza"));

  // Once nothing is in flight, the next snapshot wins: the never
  // persisted entry disappears instead of lingering locally forever.
  h.backend.write_remote("user-a", vec![record("soup", "Soup", 200.0, 1, 5)]);
  wait_until("snapshot to reconcile", || async { h.service.is_in_cart("soup") }).await;
  assert!(!h.service.is_in_cart("pizza"));
}

#[tokio::test]
async fn test_unbound_mutations_stay_local() {
  let h = harness();
  // No sign-in: mutations succeed locally, mirroring is skipped.
  h.service.add_to_cart(dish("pizza", "Pizza", "450", None));
  h.service.increment_quantity("pizza");

  assert_eq!(h.service.item_quantity("pizza"), 2);
  assert_eq!(h.service.sync_status(), SyncStatus::Unbound);
  assert!(h.backend.records("user-a").is_empty());
}

#[tokio::test]
async fn test_clear_cart_empties_remote_container() {
  let h = harness();
  h.session.sign_in("user-a");
  h.service.add_to_cart(dish("pizza", "Pizza", "450", None));
  h.service.add_to_cart(dish("soup", "Soup", "200", None));
  wait_until("both writes to land", || async { h.backend.records("user-a").len() == 2 }).await;

  // Checkout consumer reads totals once, then clears.
  assert_eq!(h.service.total_items(), 2);
  h.service.clear_cart();
  assert_eq!(h.service.total_items(), 0);

  wait_until("remote container to empty", || async {
    h.backend.records("user-a").is_empty()
  })
  .await;
}

#[tokio::test]
async fn test_stop_tears_down_and_clears() {
  let h = harness();
  h.session.sign_in("user-a");
  h.service.add_to_cart(dish("pizza", "Pizza", "450", None));
  wait_until("write to land", || async { !h.backend.records("user-a").is_empty() }).await;

  h.service.stop();
  assert!(h.service.entries().is_empty());
  assert_eq!(h.service.sync_status(), SyncStatus::Unbound);

  // Remote writes from other devices no longer reach the stopped service.
  h.backend.write_remote("user-a", vec![record("soup", "Soup", 200.0, 1, 5)]);
  tokio::time::sleep(std::time::Duration::from_millis(50)).await;
  assert!(h.service.entries().is_empty());
}

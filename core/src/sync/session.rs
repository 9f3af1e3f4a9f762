// fastcart/src/sync/session.rs

//! Signed-in identity as a watchable value.
//!
//! The auth collaborator is opaque to the engine: all it supplies is
//! "current user id or none". `Session` carries that through a
//! `tokio::sync::watch` channel so the cart service can rebind its
//! subscription whenever the identity changes and tear down on sign-out.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

#[derive(Clone)]
pub struct Session {
  identity: Arc<watch::Sender<Option<String>>>,
}

impl Default for Session {
  fn default() -> Self {
    Self::new()
  }
}

impl Session {
  /// Starts signed out.
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(None);
    Session { identity: Arc::new(tx) }
  }

  pub fn signed_in(user_id: impl Into<String>) -> Self {
    let session = Session::new();
    session.sign_in(user_id);
    session
  }

  pub fn sign_in(&self, user_id: impl Into<String>) {
    let user_id = user_id.into();
    info!(user_id = %user_id, "session signed in");
    self.identity.send_replace(Some(user_id));
  }

  pub fn sign_out(&self) {
    info!("session signed out");
    self.identity.send_replace(None);
  }

  pub fn current_user_id(&self) -> Option<String> {
    self.identity.borrow().clone()
  }

  /// Receiver that observes identity changes; used by the cart service's
  /// session-binding task.
  pub fn watch(&self) -> watch::Receiver<Option<String>> {
    self.identity.subscribe()
  }
}

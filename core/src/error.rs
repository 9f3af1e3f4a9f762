// fastcart/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CartError {
  #[error("Remote backend operation '{operation}' failed. Source: {source}")]
  Backend {
    operation: String,
    #[source]
    source: AnyhowError,
  },

  #[error("Live subscription for user '{user_id}' could not be established: {message}")]
  Subscription { user_id: String, message: String },

  #[error("Configuration error: {0}")]
  Config(String),
}

// This is the key conversion the engine provides for external transport errors:
// a backend implementation can use `?` on anyhow-wrapped client calls.
impl From<AnyhowError> for CartError {
  fn from(err: AnyhowError) -> Self {
    CartError::Backend {
      operation: "unspecified".to_string(),
      source: err,
    }
  }
}

impl CartError {
  /// Wraps a transport error, tagging the backend operation that failed.
  pub fn backend(operation: impl Into<String>, source: impl Into<AnyhowError>) -> Self {
    CartError::Backend {
      operation: operation.into(),
      source: source.into(),
    }
  }
}

pub type CartResult<T, E = CartError> = std::result::Result<T, E>;

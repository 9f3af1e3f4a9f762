// fastcart/src/config.rs

use crate::error::{CartError, CartResult};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Tuning for background write dispatch.
#[derive(Debug, Clone)]
pub struct SyncConfig {
  /// Retries after the first failed attempt before a write is given up
  /// and surfaced through `SyncStatus::Degraded`.
  pub max_write_retries: u32,
  /// Base delay between attempts; doubled after each failure.
  pub retry_backoff: Duration,
}

impl Default for SyncConfig {
  fn default() -> Self {
    SyncConfig {
      max_write_retries: 3,
      retry_backoff: Duration::from_millis(200),
    }
  }
}

impl SyncConfig {
  /// Loads overrides from the environment (and a `.env` file if present),
  /// falling back to the defaults above.
  pub fn from_env() -> CartResult<Self> {
    dotenv().ok(); // Load .env file if present

    let defaults = SyncConfig::default();

    let max_write_retries = match env::var("FASTCART_MAX_WRITE_RETRIES") {
      Ok(raw) => raw
        .parse::<u32>()
        .map_err(|e| CartError::Config(format!("Invalid FASTCART_MAX_WRITE_RETRIES: {}", e)))?,
      Err(_) => defaults.max_write_retries,
    };

    let retry_backoff = match env::var("FASTCART_RETRY_BACKOFF_MS") {
      Ok(raw) => Duration::from_millis(
        raw
          .parse::<u64>()
          .map_err(|e| CartError::Config(format!("Invalid FASTCART_RETRY_BACKOFF_MS: {}", e)))?,
      ),
      Err(_) => defaults.retry_backoff,
    };

    tracing::info!(
      max_write_retries,
      retry_backoff_ms = retry_backoff.as_millis() as u64,
      "sync configuration loaded"
    );

    Ok(SyncConfig {
      max_write_retries,
      retry_backoff,
    })
  }
}

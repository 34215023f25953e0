//! Tunables for the sync layer. Every field has a default, so an empty
//! config section deserialises to [`SyncConfig::default`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  /// Records requested per page during a full download. Also the largest
  /// page a routed query may ask for.
  pub batch_size:               u32,
  /// Consecutive empty pages after which a category download stops.
  pub max_empty_pages:          u32,
  /// Extra requests a category may spend when a short or empty page arrives
  /// without pagination metadata.
  pub ambiguous_page_retries:   u32,
  /// Attempts per page request before the category download fails.
  pub fetch_attempts:           u32,
  pub retry_delay_ms:           u64,
  /// Page size for queries that do not name one.
  pub default_page_size:        u32,
  /// Compare stored counts against `GET /directory/stats` after a download.
  pub verify_after_download:    bool,
  /// Serve online queries from a non-empty cache instead of the remote.
  pub prefer_local_when_online: bool,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      batch_size:               100,
      max_empty_pages:          3,
      ambiguous_page_retries:   1,
      fetch_attempts:           3,
      retry_delay_ms:           500,
      default_page_size:        20,
      verify_after_download:    true,
      prefer_local_when_online: true,
    }
  }
}

impl SyncConfig {
  pub fn retry_delay(&self) -> Duration { Duration::from_millis(self.retry_delay_ms) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_config_keeps_defaults() {
    let cfg: SyncConfig =
      serde_json::from_value(serde_json::json!({ "batch_size": 50 })).unwrap();
    assert_eq!(cfg.batch_size, 50);
    assert_eq!(cfg.max_empty_pages, 3);
    assert_eq!(cfg.retry_delay(), Duration::from_millis(500));
  }
}

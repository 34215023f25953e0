//! Cache bookkeeping: per-category metadata and the overall download status.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Category;

/// Metadata for one stored category collection. The records themselves are
/// read separately; `count` always equals the number stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCache {
  pub category:       Category,
  pub count:          u64,
  pub last_synced_at: Option<DateTime<Utc>>,
}

impl CategoryCache {
  pub fn empty(category: Category) -> Self {
    Self { category, count: 0, last_synced_at: None }
  }

  pub fn is_empty(&self) -> bool { self.count == 0 }
}

/// Overall offline availability, derived from the category caches and
/// recomputed after every sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadStatus {
  /// Every category has completed at least one download.
  pub is_downloaded: bool,
  pub counts:        BTreeMap<Category, u64>,
  pub last_updated:  DateTime<Utc>,
}

impl DownloadStatus {
  pub fn from_caches(caches: &[CategoryCache], now: DateTime<Utc>) -> Self {
    let counts = caches.iter().map(|c| (c.category, c.count)).collect();
    let is_downloaded = Category::ALL.iter().all(|category| {
      caches
        .iter()
        .any(|c| c.category == *category && c.last_synced_at.is_some())
    });
    Self { is_downloaded, counts, last_updated: now }
  }

  pub fn count(&self, category: Category) -> u64 {
    self.counts.get(&category).copied().unwrap_or(0)
  }

  pub fn total_records(&self) -> u64 { self.counts.values().sum() }
}

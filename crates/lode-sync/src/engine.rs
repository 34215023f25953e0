//! The Sync Engine: full downloads of the directory into the local store.
//!
//! Each category is paged through the remote directory from page 1 with a
//! fixed batch size, collected in page order, then written to the store in
//! one replacing transaction. A category that fails keeps its previous cache.
//! Categories are independent; a failure in one does not roll back another.

use std::{
  collections::{BTreeMap, HashSet},
  sync::Arc,
};

use chrono::Utc;
use lode_core::{
  Category,
  cache::DownloadStatus,
  query::{DirectoryQuery, RemotePage, RemotePagination},
  record::DirectoryRecord,
  remote::RemoteDirectory,
  store::LocalStore,
};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{Error, Result, SyncConfig};

// ─── Progress ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
  Idle,
  Downloading,
  Completed,
  Failed,
}

/// Download progress, published on a watch channel. Percentages are in
/// `0..=100` and never decrease within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncProgress {
  pub phase:      SyncPhase,
  /// One entry per category in the current run.
  pub categories: BTreeMap<Category, u8>,
  /// Mean of the per-category values.
  pub overall:    u8,
}

impl SyncProgress {
  fn idle() -> Self {
    Self { phase: SyncPhase::Idle, categories: BTreeMap::new(), overall: 0 }
  }

  fn start(categories: &[Category]) -> Self {
    Self {
      phase:      SyncPhase::Downloading,
      categories: categories.iter().map(|c| (*c, 0)).collect(),
      overall:    0,
    }
  }

  fn advance(&mut self, category: Category, percent: u8) {
    let entry = self.categories.entry(category).or_insert(0);
    *entry = (*entry).max(percent.min(100));
    self.recompute_overall();
  }

  fn recompute_overall(&mut self) {
    if self.categories.is_empty() {
      return;
    }
    let sum: u32 = self.categories.values().map(|p| u32::from(*p)).sum();
    let mean = sum / self.categories.len() as u32;
    self.overall = self.overall.max(u8::try_from(mean).unwrap_or(100));
  }

  fn finish(&mut self, phase: SyncPhase) {
    self.phase = phase;
    if phase == SyncPhase::Completed {
      self.categories.values_mut().for_each(|p| *p = 100);
      self.overall = 100;
    }
  }
}

/// Estimate a category's completion after a page. With a known remote total
/// this is the fetched fraction, held below 100 until the download finishes;
/// otherwise it approaches 95 as pages accumulate.
fn estimate_percent(fetched: usize, pages: u32, remote_total: Option<u64>) -> u8 {
  match remote_total {
    Some(total) if total > 0 => {
      let pct = (fetched as u64).saturating_mul(100) / total;
      pct.min(99) as u8
    }
    _ => {
      let pct = 100 - 100 / (u64::from(pages) + 1);
      pct.min(95) as u8
    }
  }
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySyncReport {
  pub category:       Category,
  /// Page requests issued, including ambiguous-end retries.
  pub requests:       u32,
  /// Pages that delivered at least one record.
  pub pages_fetched:  u32,
  pub records_stored: u64,
  /// Records whose remote id had already been seen in this download. They
  /// are stored regardless.
  pub duplicate_ids:  u64,
  /// The remote's own count, when verification ran and succeeded.
  pub remote_total:   Option<u64>,
  pub count_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
  pub categories: Vec<CategorySyncReport>,
  pub status:     DownloadStatus,
}

impl SyncReport {
  pub fn records_stored(&self) -> u64 {
    self.categories.iter().map(|c| c.records_stored).sum()
  }
}

/// Everything one category's paging loop collected.
struct Download {
  records:       Vec<DirectoryRecord>,
  requests:      u32,
  pages_fetched: u32,
  duplicate_ids: u64,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct SyncEngine<S, R> {
  store:    Arc<S>,
  remote:   Arc<R>,
  config:   SyncConfig,
  progress: watch::Sender<SyncProgress>,
}

impl<S, R> SyncEngine<S, R>
where
  S: LocalStore,
  R: RemoteDirectory,
{
  pub fn new(store: Arc<S>, remote: Arc<R>, config: SyncConfig) -> Self {
    let (progress, _) = watch::channel(SyncProgress::idle());
    Self { store, remote, config, progress }
  }

  pub fn progress(&self) -> watch::Receiver<SyncProgress> { self.progress.subscribe() }

  /// Download every category concurrently.
  ///
  /// All categories run to completion even if one fails; the first failure
  /// is returned after the download status has been refreshed.
  pub async fn download_all(&self) -> Result<SyncReport> {
    self.progress.send_replace(SyncProgress::start(&Category::ALL));
    info!("starting full directory download");

    let (national, local, hotspots) = tokio::join!(
      self.run_category(Category::National),
      self.run_category(Category::Local),
      self.run_category(Category::Hotspots),
    );
    let status = self.refresh_download_status().await;

    let mut categories = Vec::with_capacity(Category::ALL.len());
    let mut first_error = None;
    for (category, result) in Category::ALL.into_iter().zip([national, local, hotspots]) {
      match result {
        Ok(report) => categories.push(report),
        Err(err) => {
          error!(category = %category, error = %err, "category download failed");
          first_error.get_or_insert(err);
        }
      }
    }

    self.conclude(first_error, status, categories)
  }

  /// Download a single category.
  pub async fn download_category(&self, category: Category) -> Result<SyncReport> {
    self.progress.send_replace(SyncProgress::start(&[category]));

    let result = self.run_category(category).await;
    let status = self.refresh_download_status().await;

    match result {
      Ok(report) => self.conclude(None, status, vec![report]),
      Err(err) => {
        error!(category = %category, error = %err, "category download failed");
        self.conclude(Some(err), status, vec![])
      }
    }
  }

  /// Recompute the download status from what the store holds and persist it.
  pub async fn refresh_download_status(&self) -> Result<DownloadStatus> {
    let mut caches = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
      caches.push(
        self
          .store
          .category_cache(category)
          .await
          .map_err(Error::storage)?,
      );
    }
    let status = DownloadStatus::from_caches(&caches, Utc::now());
    self
      .store
      .save_download_status(&status)
      .await
      .map_err(Error::storage)?;
    debug!(is_downloaded = status.is_downloaded, total = status.total_records(), "download status saved");
    Ok(status)
  }

  fn conclude(
    &self,
    failure: Option<Error>,
    status: Result<DownloadStatus>,
    categories: Vec<CategorySyncReport>,
  ) -> Result<SyncReport> {
    let outcome = match failure {
      Some(err) => Err(err),
      None => status.map(|status| SyncReport { categories, status }),
    };
    let phase = if outcome.is_ok() { SyncPhase::Completed } else { SyncPhase::Failed };
    self.progress.send_modify(|p| p.finish(phase));
    outcome
  }

  async fn run_category(&self, category: Category) -> Result<CategorySyncReport> {
    let download = self.fetch_category(category).await?;

    let cache = self
      .store
      .replace_records(category, download.records)
      .await
      .map_err(Error::storage)?;
    self.progress.send_modify(|p| p.advance(category, 100));

    let remote_total = self.verify(category, cache.count).await;
    let count_verified = remote_total == Some(cache.count);

    info!(
      category = %category,
      records = cache.count,
      pages = download.pages_fetched,
      duplicates = download.duplicate_ids,
      "category downloaded"
    );

    Ok(CategorySyncReport {
      category,
      requests: download.requests,
      pages_fetched: download.pages_fetched,
      records_stored: cache.count,
      duplicate_ids: download.duplicate_ids,
      remote_total,
      count_verified,
    })
  }

  /// Page through one category until the termination rules say stop.
  async fn fetch_category(&self, category: Category) -> Result<Download> {
    let limit = self.config.batch_size.max(1);
    let mut page = 1;
    let mut records = Vec::new();
    let mut seen = HashSet::new();
    let mut duplicate_ids = 0;
    let mut requests = 0;
    let mut pages_fetched = 0;
    let mut empty_streak = 0;
    let mut ambiguity_budget = self.config.ambiguous_page_retries;
    let mut remote_total = None;

    loop {
      let RemotePage { records: batch, pagination } =
        self.fetch_with_retry(category, page, limit).await?;
      requests += 1;

      let batch_len = batch.len();
      let more_signalled = pagination.as_ref().is_some_and(RemotePagination::signals_more);
      if let Some(total) = pagination.as_ref().and_then(|p| p.total_records) {
        remote_total = Some(total);
      }

      if batch_len == 0 {
        empty_streak += 1;
      } else {
        empty_streak = 0;
        pages_fetched += 1;
        for record in &batch {
          if !seen.insert(record.record_id().to_owned()) {
            duplicate_ids += 1;
          }
        }
        records.extend(batch);
        let pct = estimate_percent(records.len(), pages_fetched, remote_total);
        self.progress.send_modify(|p| p.advance(category, pct));
      }

      debug!(
        category = %category,
        page,
        records = batch_len,
        total = records.len(),
        has_metadata = pagination.is_some(),
        "fetched page"
      );

      if empty_streak >= self.config.max_empty_pages.max(1) {
        warn!(category = %category, page, empty_streak, "too many empty pages; stopping");
        break;
      }

      if batch_len > 0 && (batch_len >= limit as usize || more_signalled) {
        page += 1;
        continue;
      }

      // A short or empty page with no metadata is ambiguous. An empty page is
      // requested again; after a short page the next one is still requested.
      if pagination.is_none() && ambiguity_budget > 0 {
        ambiguity_budget -= 1;
        if batch_len > 0 {
          page += 1;
        }
        debug!(category = %category, page, "ambiguous end of data; trying again");
        continue;
      }

      break;
    }

    Ok(Download { records, requests, pages_fetched, duplicate_ids })
  }

  async fn fetch_with_retry(
    &self,
    category: Category,
    page: u32,
    limit: u32,
  ) -> Result<RemotePage> {
    let query = DirectoryQuery::page(page, limit);
    let attempts = self.config.fetch_attempts.max(1);
    let mut attempt = 1;
    loop {
      match self.remote.fetch_page(category, &query).await {
        Ok(response) => return Ok(response),
        Err(err) if attempt < attempts => {
          warn!(category = %category, page, attempt, error = %err, "page fetch failed; retrying");
          attempt += 1;
          tokio::time::sleep(self.config.retry_delay()).await;
        }
        Err(err) => return Err(err.into()),
      }
    }
  }

  /// Best-effort comparison with the remote's published count. Returns the
  /// remote count when it could be read.
  async fn verify(&self, category: Category, stored: u64) -> Option<u64> {
    if !self.config.verify_after_download {
      return None;
    }
    match self.remote.fetch_stats().await {
      Ok(stats) => {
        let remote = stats.count(category);
        if remote != stored {
          warn!(category = %category, remote, stored, "stored count differs from remote total");
        }
        Some(remote)
      }
      Err(err) => {
        warn!(category = %category, error = %err, "could not verify stored count");
        None
      }
    }
  }
}

//! The `LocalStore` trait for durable on-device storage.
//!
//! The trait is implemented by storage backends (e.g. `lode-store-sqlite`).
//! The sync layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  Category,
  cache::{CategoryCache, DownloadStatus},
  draft::{Draft, DraftPatch},
  query::{DirectoryQuery, QueryPage},
  record::DirectoryRecord,
  session::AuthSession,
};

/// Abstraction over a Lode local store backend.
///
/// Directory records are an append-only log per category keyed by a synthetic
/// row id; the remote identifier is a non-unique attribute. Every write is
/// durable before the returned future resolves, and a category's count is
/// updated in the same transaction as its records.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait LocalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Directory records ─────────────────────────────────────────────────

  /// Replace a category's entire collection (full-sync write) and stamp its
  /// last-sync time.
  fn replace_records(
    &self,
    category: Category,
    records: Vec<DirectoryRecord>,
  ) -> impl Future<Output = Result<CategoryCache, Self::Error>> + Send + '_;

  /// Append to a category's collection (incremental write). Existing records
  /// are kept, including ones sharing a remote identifier with the new ones.
  fn append_records(
    &self,
    category: Category,
    records: Vec<DirectoryRecord>,
  ) -> impl Future<Output = Result<CategoryCache, Self::Error>> + Send + '_;

  /// The full collection in insertion order.
  fn get_records(
    &self,
    category: Category,
  ) -> impl Future<Output = Result<Vec<DirectoryRecord>, Self::Error>> + Send + '_;

  /// Search, filter, then paginate a collection.
  fn query<'a>(
    &'a self,
    category: Category,
    query: &'a DirectoryQuery,
  ) -> impl Future<Output = Result<QueryPage, Self::Error>> + Send + 'a;

  /// Count and last-sync time for a category.
  fn category_cache(
    &self,
    category: Category,
  ) -> impl Future<Output = Result<CategoryCache, Self::Error>> + Send + '_;

  fn clear_category(
    &self,
    category: Category,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn clear_all(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Download status ───────────────────────────────────────────────────

  fn save_download_status<'a>(
    &'a self,
    status: &'a DownloadStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// `None` until the first sync has been recorded.
  fn download_status(
    &self,
  ) -> impl Future<Output = Result<Option<DownloadStatus>, Self::Error>> + Send + '_;

  // ── Drafts ────────────────────────────────────────────────────────────

  /// Insert or overwrite a draft by id.
  fn save_draft(
    &self,
    draft: Draft,
  ) -> impl Future<Output = Result<Draft, Self::Error>> + Send + '_;

  fn get_draft<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Draft>, Self::Error>> + Send + 'a;

  /// All drafts by `reporter_id`, most recently updated first.
  fn get_drafts<'a>(
    &'a self,
    reporter_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Draft>, Self::Error>> + Send + 'a;

  /// Apply a user edit as one atomic read-modify-write. Returns `None` if no
  /// draft has this id.
  fn update_draft<'a>(
    &'a self,
    id: &'a str,
    patch: &'a DraftPatch,
  ) -> impl Future<Output = Result<Option<Draft>, Self::Error>> + Send + 'a;

  /// Returns whether a draft was deleted.
  fn delete_draft<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Delete local copies of a pushed draft, matched by `remote_id`. Returns
  /// how many were deleted.
  fn delete_local_copies<'a>(
    &'a self,
    remote_id: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Every draft with `needs_sync` set, oldest first.
  fn list_unsynced(
    &self,
  ) -> impl Future<Output = Result<Vec<Draft>, Self::Error>> + Send + '_;

  /// Record a successful push of the version last edited at `pushed_version`.
  /// `remote_id` is stored regardless; `needs_sync` is cleared only if the
  /// draft has not been edited since, atomically with that check. Returns
  /// `None` if no draft has this id.
  fn mark_synced<'a>(
    &'a self,
    id: &'a str,
    remote_id: Option<String>,
    pushed_version: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Draft>, Self::Error>> + Send + 'a;

  // ── Session ───────────────────────────────────────────────────────────

  fn save_session<'a>(
    &'a self,
    session: &'a AuthSession,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn load_session(
    &self,
  ) -> impl Future<Output = Result<Option<AuthSession>, Self::Error>> + Send + '_;

  fn clear_session(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

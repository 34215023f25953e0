//! The Draft Reconciler: saves, edits and deletes report drafts against the
//! remote service when it can and the local store when it cannot, and pushes
//! locally held drafts once connectivity returns.
//!
//! A draft moves `LocalUnsynced → Syncing → RemoteSynced`; a failed push
//! returns it to `LocalUnsynced` for the next pass. There is no terminal
//! failure state.

use std::{
  collections::HashSet,
  sync::{Arc, Mutex},
};

use chrono::Utc;
use lode_core::{
  draft::{Draft, DraftListing, DraftOrigin, DraftPatch, NewDraft, is_local_id},
  remote::RemoteDrafts,
  store::LocalStore,
};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{Connectivity, Error, Result};

/// Page size used when reading a reporter's remote drafts.
const REMOTE_LIST_PAGE_SIZE: u32 = 50;
/// Upper bound on remote draft pages read by one listing.
const REMOTE_LIST_MAX_PAGES: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftSyncState {
  LocalUnsynced,
  Syncing,
  RemoteSynced,
}

/// Outcome of one push pass. Ids are the local draft ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncAllReport {
  pub attempted:  usize,
  pub synced:     Vec<String>,
  /// Pushed, but edited locally while the push was in flight; still
  /// unsynced so the next pass sends the newer content.
  pub superseded: Vec<String>,
  pub failed:     Vec<String>,
}

pub struct DraftReconciler<S, R> {
  store:        Arc<S>,
  remote:       Arc<R>,
  connectivity: Arc<dyn Connectivity>,
  /// Ids of drafts with a push in flight.
  syncing:      Mutex<HashSet<String>>,
}

/// Holds a draft in the `Syncing` state until dropped.
struct SyncingGuard<'a> {
  set: &'a Mutex<HashSet<String>>,
  id:  String,
}

impl Drop for SyncingGuard<'_> {
  fn drop(&mut self) {
    if let Ok(mut set) = self.set.lock() {
      set.remove(&self.id);
    }
  }
}

impl<S, R> DraftReconciler<S, R>
where
  S: LocalStore,
  R: RemoteDrafts,
{
  pub fn new(store: Arc<S>, remote: Arc<R>, connectivity: Arc<dyn Connectivity>) -> Self {
    Self { store, remote, connectivity, syncing: Mutex::new(HashSet::new()) }
  }

  pub fn state(&self, draft: &Draft) -> DraftSyncState {
    let in_flight = self
      .syncing
      .lock()
      .map(|set| set.contains(&draft.id))
      .unwrap_or(false);
    if in_flight {
      DraftSyncState::Syncing
    } else if draft.needs_sync || !draft.is_synced {
      DraftSyncState::LocalUnsynced
    } else {
      DraftSyncState::RemoteSynced
    }
  }

  // ── Operations ──────────────────────────────────────────────────────────

  /// Create a draft remotely when online; otherwise, or if the remote call
  /// fails for any reason, keep it locally for a later push.
  pub async fn save(&self, input: NewDraft) -> Result<Draft> {
    if self.connectivity.is_online() {
      match self.remote.create_draft(&input).await {
        Ok(draft) => {
          info!(id = %draft.id, "draft created remotely");
          return Ok(draft);
        }
        Err(err) => warn!(error = %err, "remote draft create failed; saving locally"),
      }
    }

    let draft = Draft::new_local(input, Utc::now());
    let draft = self.store.save_draft(draft).await.map_err(Error::storage)?;
    debug!(id = %draft.id, "draft saved locally");
    Ok(draft)
  }

  /// Edit a draft. Locally originated ids are edited in the local store
  /// whatever the connectivity; remote ids need the remote service.
  pub async fn update(&self, id: &str, patch: &DraftPatch) -> Result<Draft> {
    if is_local_id(id) {
      return self
        .store
        .update_draft(id, patch)
        .await
        .map_err(Error::storage)?
        .ok_or_else(|| Error::DraftNotFound(id.to_owned()));
    }

    if !self.connectivity.is_online() {
      return Err(Error::NetworkUnavailable(format!(
        "remote draft {id} cannot be edited while offline"
      )));
    }
    let draft = self
      .remote
      .update_draft(id, patch)
      .await
      .map_err(|err| Error::for_draft(id, err))?;
    debug!(id, "draft updated remotely");
    Ok(draft)
  }

  /// Delete a draft. Remote drafts cannot be deleted offline; once deleted
  /// remotely, any local copy that was pushed as that draft goes too.
  pub async fn delete(&self, id: &str) -> Result<()> {
    if is_local_id(id) {
      let deleted = self.store.delete_draft(id).await.map_err(Error::storage)?;
      return if deleted { Ok(()) } else { Err(Error::DraftNotFound(id.to_owned())) };
    }

    if !self.connectivity.is_online() {
      return Err(Error::OfflineDeleteUnsupported(id.to_owned()));
    }
    self
      .remote
      .delete_draft(id)
      .await
      .map_err(|err| Error::for_draft(id, err))?;
    let mirrors = self
      .store
      .delete_local_copies(id)
      .await
      .map_err(Error::storage)?;
    debug!(id, mirrors, "draft deleted remotely");
    Ok(())
  }

  /// One pass over `reporter_id`'s unsynced drafts. Each is pushed once;
  /// failures stay unsynced for the next pass.
  pub async fn sync_all(&self, reporter_id: &str) -> Result<SyncAllReport> {
    if !self.connectivity.is_online() {
      return Err(Error::NetworkUnavailable("drafts cannot be synced while offline".into()));
    }

    let pending: Vec<Draft> = self
      .store
      .list_unsynced()
      .await
      .map_err(Error::storage)?
      .into_iter()
      .filter(|d| d.reporter_id == reporter_id)
      .collect();

    let mut report = SyncAllReport::default();
    for draft in pending {
      let Some(_guard) = self.begin_syncing(&draft.id) else {
        debug!(id = %draft.id, "push already in flight; skipping");
        continue;
      };
      report.attempted += 1;

      let pushed = match &draft.remote_id {
        Some(remote_id) => self.remote.update_draft(remote_id, &draft.to_full_patch()).await,
        None => self.remote.create_draft(&draft.to_new_draft()).await,
      };

      match pushed {
        Ok(remote) => {
          let stored = self
            .store
            .mark_synced(&draft.id, Some(remote.id), draft.updated_at)
            .await
            .map_err(Error::storage)?;
          if stored.is_some_and(|d| d.needs_sync) {
            debug!(id = %draft.id, "draft edited during push; keeping it unsynced");
            report.superseded.push(draft.id);
          } else {
            report.synced.push(draft.id);
          }
        }
        Err(err) => {
          warn!(id = %draft.id, error = %err, "draft push failed; will retry on next sync");
          report.failed.push(draft.id);
        }
      }
    }

    info!(
      reporter_id,
      attempted = report.attempted,
      synced = report.synced.len(),
      superseded = report.superseded.len(),
      failed = report.failed.len(),
      "draft sync pass finished"
    );
    Ok(report)
  }

  /// Push the signed-in reporter's drafts.
  pub async fn sync_signed_in(&self) -> Result<SyncAllReport> {
    let session = self
      .store
      .load_session()
      .await
      .map_err(Error::storage)?
      .ok_or(Error::NotAuthenticated)?;
    self.sync_all(session.reporter_id()).await
  }

  /// Local and remote drafts for `reporter_id`, newest first. A local copy
  /// is hidden once the remote listing contains the draft it was pushed as.
  /// Offline, or if the remote listing fails, only local drafts are listed.
  pub async fn list_all(&self, reporter_id: &str) -> Result<Vec<DraftListing>> {
    let local = self
      .store
      .get_drafts(reporter_id)
      .await
      .map_err(Error::storage)?;

    let remote = if self.connectivity.is_online() {
      match self.list_remote(reporter_id).await {
        Ok(drafts) => drafts,
        Err(err) => {
          warn!(error = %err, "remote draft listing failed; listing local drafts only");
          Vec::new()
        }
      }
    } else {
      Vec::new()
    };

    let remote_ids: HashSet<&str> = remote.iter().map(|d| d.id.as_str()).collect();
    let mut listings: Vec<DraftListing> = local
      .iter()
      .filter(|d| {
        !d.remote_id
          .as_deref()
          .is_some_and(|rid| remote_ids.contains(rid))
      })
      .cloned()
      .map(|draft| DraftListing { draft, origin: DraftOrigin::Local })
      .collect();
    listings.extend(
      remote
        .iter()
        .cloned()
        .map(|draft| DraftListing { draft, origin: DraftOrigin::Remote }),
    );

    listings.sort_by(|a, b| b.draft.updated_at.cmp(&a.draft.updated_at));
    Ok(listings)
  }

  async fn list_remote(&self, reporter_id: &str) -> Result<Vec<Draft>> {
    let mut drafts = Vec::new();
    for page in 1..=REMOTE_LIST_MAX_PAGES {
      let listing = self
        .remote
        .list_drafts(reporter_id, page, REMOTE_LIST_PAGE_SIZE)
        .await?;
      let returned = listing.drafts.len();
      drafts.extend(listing.drafts);

      let more = match &listing.pagination {
        Some(p) => p.signals_more(),
        None => returned >= REMOTE_LIST_PAGE_SIZE as usize,
      };
      if returned == 0 || !more {
        break;
      }
    }
    Ok(drafts)
  }

  fn begin_syncing(&self, id: &str) -> Option<SyncingGuard<'_>> {
    let mut set = self.syncing.lock().ok()?;
    if !set.insert(id.to_owned()) {
      return None;
    }
    Some(SyncingGuard { set: &self.syncing, id: id.to_owned() })
  }
}

impl<S, R> DraftReconciler<S, R>
where
  S: LocalStore + 'static,
  R: RemoteDrafts + 'static,
{
  /// Run one [`sync_signed_in`](Self::sync_signed_in) pass on every
  /// offline→online transition. Repeated reports of the same state do not
  /// trigger a pass. Transitions that happen while a pass runs, or before
  /// the task is first polled, are counted and each gets its own pass.
  pub fn spawn_auto_resync(self: &Arc<Self>) -> JoinHandle<()> {
    let reconciler = Arc::clone(self);
    let mut rx = self.connectivity.subscribe();
    let mut seen_edges = rx.borrow_and_update().online_edges;
    tokio::spawn(async move {
      while rx.changed().await.is_ok() {
        let edges = rx.borrow_and_update().online_edges;
        while seen_edges < edges {
          seen_edges += 1;
          reconciler.resync_once().await;
        }
      }
    })
  }

  async fn resync_once(&self) {
    match self.sync_signed_in().await {
      Ok(report) => debug!(synced = report.synced.len(), "automatic draft sync done"),
      Err(Error::NotAuthenticated) => debug!("not signed in; skipping automatic draft sync"),
      Err(err) => warn!(error = %err, "automatic draft sync failed"),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use lode_core::session::{AuthSession, UserProfile};
  use lode_store_sqlite::SqliteStore;
  use serde_json::json;

  use super::*;
  use crate::{
    ConnectivityMonitor,
    testing::{FakeDrafts, new_draft, store},
  };

  struct Harness {
    store:      Arc<SqliteStore>,
    remote:     Arc<FakeDrafts>,
    monitor:    ConnectivityMonitor,
    reconciler: Arc<DraftReconciler<SqliteStore, FakeDrafts>>,
  }

  async fn harness(online: bool) -> Harness {
    let store = Arc::new(store().await);
    let remote = Arc::new(FakeDrafts::new());
    let monitor = ConnectivityMonitor::new(online);
    let reconciler = Arc::new(DraftReconciler::new(
      store.clone(),
      remote.clone(),
      Arc::new(monitor.clone()),
    ));
    Harness { store, remote, monitor, reconciler }
  }

  async fn sign_in(store: &SqliteStore, user_id: &str) {
    let session = AuthSession {
      token:     "jwt".into(),
      user:      UserProfile {
        id:    user_id.into(),
        email: "inspector@example.gov".into(),
        name:  None,
        role:  None,
      },
      signed_in: Utc::now(),
    };
    store.save_session(&session).await.unwrap();
  }

  /// Poll until `cond` holds, failing after a second.
  async fn eventually(cond: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
      while !cond() {
        tokio::time::sleep(Duration::from_millis(5)).await;
      }
    })
    .await
    .expect("condition not reached");
  }

  // ── save / update / delete ──────────────────────────────────────────────

  #[tokio::test]
  async fn online_save_creates_remotely() {
    let h = harness(true).await;
    let draft = h.reconciler.save(new_draft("u1", "Sitio Gold")).await.unwrap();

    assert!(!is_local_id(&draft.id));
    assert_eq!(h.reconciler.state(&draft), DraftSyncState::RemoteSynced);
    assert!(h.store.list_unsynced().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn remote_failure_falls_back_to_local_save() {
    let h = harness(true).await;
    h.remote.set_failing(true);

    let draft = h.reconciler.save(new_draft("u1", "Sitio Gold")).await.unwrap();

    assert!(is_local_id(&draft.id));
    assert!(draft.needs_sync);
    assert_eq!(h.reconciler.state(&draft), DraftSyncState::LocalUnsynced);
    assert_eq!(h.store.list_unsynced().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn local_ids_update_locally_even_online() {
    let h = harness(false).await;
    let draft = h.reconciler.save(new_draft("u1", "Sitio Gold")).await.unwrap();
    h.monitor.set_online(true);

    let patch = DraftPatch { form_data: Some(json!({ "site": "Tuba" })), ..Default::default() };
    let first = h.reconciler.update(&draft.id, &patch).await.unwrap();
    let second = h.reconciler.update(&draft.id, &patch).await.unwrap();

    assert_eq!(h.remote.updates(), 0);
    assert_eq!(second.form_data, json!({ "site": "Tuba" }));
    assert!(first.updated_at > draft.updated_at);
    assert!(second.updated_at > first.updated_at);
  }

  #[tokio::test]
  async fn remote_update_needs_connectivity() {
    let h = harness(true).await;
    let draft = h.reconciler.save(new_draft("u1", "Sitio Gold")).await.unwrap();
    h.monitor.set_online(false);

    let err = h
      .reconciler
      .update(&draft.id, &DraftPatch::default())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::NetworkUnavailable(_)));
  }

  #[tokio::test]
  async fn unknown_drafts_are_not_found() {
    let h = harness(true).await;
    let err = h.reconciler.delete("local_missing").await.unwrap_err();
    assert!(matches!(err, Error::DraftNotFound(_)));

    let err = h.reconciler.update("65f0missing", &DraftPatch::default()).await.unwrap_err();
    assert!(matches!(err, Error::DraftNotFound(_)));
  }

  #[tokio::test]
  async fn remote_delete_offline_is_refused() {
    let h = harness(true).await;
    let draft = h.reconciler.save(new_draft("u1", "Sitio Gold")).await.unwrap();
    h.monitor.set_online(false);

    let err = h.reconciler.delete(&draft.id).await.unwrap_err();
    assert!(matches!(err, Error::OfflineDeleteUnsupported(_)));
    assert_eq!(h.remote.stored().len(), 1);
  }

  #[tokio::test]
  async fn local_delete_works_offline() {
    let h = harness(false).await;
    let draft = h.reconciler.save(new_draft("u1", "Sitio Gold")).await.unwrap();

    h.reconciler.delete(&draft.id).await.unwrap();
    assert!(h.store.get_draft(&draft.id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn remote_delete_drops_local_copies() {
    let h = harness(false).await;
    let draft = h.reconciler.save(new_draft("u1", "Sitio Gold")).await.unwrap();
    h.monitor.set_online(true);
    h.reconciler.sync_all("u1").await.unwrap();
    let remote_id = h.store.get_draft(&draft.id).await.unwrap().unwrap().remote_id.unwrap();

    h.reconciler.delete(&remote_id).await.unwrap();

    assert!(h.remote.stored().is_empty());
    assert!(h.store.get_draft(&draft.id).await.unwrap().is_none());
  }

  // ── sync_all ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn offline_draft_is_synced_when_back_online() {
    let h = harness(false).await;
    let draft = h.reconciler.save(new_draft("u1", "Sitio Gold")).await.unwrap();
    h.reconciler.save(new_draft("u2", "Elsewhere")).await.unwrap();

    h.monitor.set_online(true);
    let report = h.reconciler.sync_all("u1").await.unwrap();

    assert_eq!(report.attempted, 1);
    assert_eq!(report.synced, vec![draft.id.clone()]);
    let stored = h.store.get_draft(&draft.id).await.unwrap().unwrap();
    assert!(stored.is_synced);
    assert!(!stored.needs_sync);
    assert!(stored.remote_id.is_some());
    let unsynced = h.store.list_unsynced().await.unwrap();
    assert!(unsynced.iter().all(|d| d.id != draft.id));
    assert_eq!(unsynced.len(), 1);
  }

  #[tokio::test]
  async fn failed_pushes_stay_unsynced() {
    let h = harness(false).await;
    let draft = h.reconciler.save(new_draft("u1", "Sitio Gold")).await.unwrap();
    h.monitor.set_online(true);
    h.remote.set_failing(true);

    let report = h.reconciler.sync_all("u1").await.unwrap();
    assert_eq!(report.failed, vec![draft.id.clone()]);
    assert!(h.store.get_draft(&draft.id).await.unwrap().unwrap().needs_sync);

    h.remote.set_failing(false);
    let report = h.reconciler.sync_all("u1").await.unwrap();
    assert_eq!(report.synced, vec![draft.id]);
  }

  #[tokio::test]
  async fn edited_synced_copy_is_pushed_as_an_update() {
    let h = harness(false).await;
    let draft = h.reconciler.save(new_draft("u1", "Sitio Gold")).await.unwrap();
    h.monitor.set_online(true);
    h.reconciler.sync_all("u1").await.unwrap();

    let patch = DraftPatch { form_data: Some(json!({ "site": "Tuba" })), ..Default::default() };
    h.reconciler.update(&draft.id, &patch).await.unwrap();
    let report = h.reconciler.sync_all("u1").await.unwrap();

    assert_eq!(report.synced.len(), 1);
    assert_eq!(h.remote.creates(), 1);
    assert_eq!(h.remote.updates(), 1);
    assert_eq!(h.remote.stored()[0].form_data, json!({ "site": "Tuba" }));
  }

  #[tokio::test]
  async fn edit_during_push_stays_unsynced() {
    let h = harness(false).await;
    let draft = h.reconciler.save(new_draft("u1", "Sitio Gold")).await.unwrap();
    h.monitor.set_online(true);
    h.remote.set_create_delay(Duration::from_millis(100));

    let reconciler = Arc::clone(&h.reconciler);
    let pass = tokio::spawn(async move { reconciler.sync_all("u1").await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    let patch = DraftPatch { form_data: Some(json!({ "site": "Tuba" })), ..Default::default() };
    h.reconciler.update(&draft.id, &patch).await.unwrap();

    let report = pass.await.unwrap().unwrap();
    assert_eq!(report.superseded, vec![draft.id.clone()]);
    assert!(report.synced.is_empty());
    let stored = h.store.get_draft(&draft.id).await.unwrap().unwrap();
    assert!(stored.needs_sync);
    assert!(stored.remote_id.is_some());
    assert_eq!(stored.form_data, json!({ "site": "Tuba" }));
    assert_eq!(h.remote.stored()[0].form_data, json!({ "site": "Sitio Gold" }));

    // The next pass sends the edit to the draft the first push created.
    let report = h.reconciler.sync_all("u1").await.unwrap();
    assert_eq!(report.synced, vec![draft.id.clone()]);
    assert_eq!(h.remote.creates(), 1);
    assert_eq!(h.remote.updates(), 1);
    assert_eq!(h.remote.stored()[0].form_data, json!({ "site": "Tuba" }));
    assert!(!h.store.get_draft(&draft.id).await.unwrap().unwrap().needs_sync);
  }

  #[tokio::test]
  async fn sync_all_offline_is_refused() {
    let h = harness(false).await;
    let err = h.reconciler.sync_all("u1").await.unwrap_err();
    assert!(matches!(err, Error::NetworkUnavailable(_)));
  }

  // ── list_all ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_all_merges_and_hides_pushed_copies() {
    let h = harness(false).await;
    let pushed = h.reconciler.save(new_draft("u1", "pushed")).await.unwrap();
    h.monitor.set_online(true);
    h.reconciler.sync_all("u1").await.unwrap();
    h.remote.seed(new_draft("u1", "from another device"));

    h.monitor.set_online(false);
    let pending = h.reconciler.save(new_draft("u1", "pending")).await.unwrap();
    h.monitor.set_online(true);

    let listings = h.reconciler.list_all("u1").await.unwrap();

    assert_eq!(listings.len(), 3);
    assert!(listings.iter().all(|l| l.draft.id != pushed.id));
    assert_eq!(listings[0].draft.id, pending.id);
    assert_eq!(listings[0].origin, DraftOrigin::Local);
    assert_eq!(listings.iter().filter(|l| l.origin == DraftOrigin::Remote).count(), 2);
    assert!(
      listings
        .windows(2)
        .all(|w| w[0].draft.updated_at >= w[1].draft.updated_at)
    );
  }

  #[tokio::test]
  async fn list_all_offline_shows_local_drafts() {
    let h = harness(false).await;
    h.reconciler.save(new_draft("u1", "a")).await.unwrap();
    h.reconciler.save(new_draft("u1", "b")).await.unwrap();

    let listings = h.reconciler.list_all("u1").await.unwrap();
    assert_eq!(listings.len(), 2);
    assert!(listings.iter().all(|l| l.origin == DraftOrigin::Local));
  }

  // ── auto resync ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn one_sync_pass_per_online_edge() {
    let h = harness(false).await;
    sign_in(&h.store, "u1").await;
    h.reconciler.save(new_draft("u1", "Sitio Gold")).await.unwrap();
    // Every push fails, so each pass attempts the same draft again.
    h.remote.set_failing(true);
    let task = h.reconciler.spawn_auto_resync();

    h.monitor.set_online(true);
    eventually(|| h.remote.creates() == 1).await;

    h.monitor.set_online(true);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.remote.creates(), 1);

    // A flicker the task never observes still counts as an edge.
    h.monitor.set_online(false);
    h.monitor.set_online(true);
    eventually(|| h.remote.creates() == 2).await;

    task.abort();
  }

  #[tokio::test]
  async fn online_edge_during_a_pass_triggers_another() {
    let h = harness(false).await;
    sign_in(&h.store, "u1").await;
    h.reconciler.save(new_draft("u1", "first")).await.unwrap();
    h.remote.set_create_delay(Duration::from_millis(100));
    let task = h.reconciler.spawn_auto_resync();

    h.monitor.set_online(true);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.remote.creates(), 1);

    // Drop out and come back while the first push is still in flight.
    h.monitor.set_online(false);
    h.reconciler.save(new_draft("u1", "second")).await.unwrap();
    h.monitor.set_online(true);

    tokio::time::timeout(Duration::from_secs(2), async {
      while !h.store.list_unsynced().await.unwrap().is_empty() {
        tokio::time::sleep(Duration::from_millis(10)).await;
      }
    })
    .await
    .expect("second draft never synced");

    assert_eq!(h.remote.creates(), 2);
    assert_eq!(h.remote.stored().len(), 2);
    task.abort();
  }

  #[tokio::test]
  async fn auto_resync_pushes_offline_drafts() {
    let h = harness(false).await;
    sign_in(&h.store, "u1").await;
    let draft = h.reconciler.save(new_draft("u1", "Sitio Gold")).await.unwrap();
    let task = h.reconciler.spawn_auto_resync();

    h.monitor.set_online(true);
    tokio::time::timeout(Duration::from_secs(1), async {
      while h.store.list_unsynced().await.unwrap().iter().any(|d| d.id == draft.id) {
        tokio::time::sleep(Duration::from_millis(5)).await;
      }
    })
    .await
    .expect("draft never synced");

    let stored = h.store.get_draft(&draft.id).await.unwrap().unwrap();
    assert!(stored.is_synced);
    assert_eq!(h.remote.stored().len(), 1);
    task.abort();
  }
}

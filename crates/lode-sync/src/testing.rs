//! In-process fakes for the remote traits, shared by the sync-layer tests.

use std::{
  collections::HashMap,
  sync::{
    Mutex,
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::Utc;
use lode_core::{
  Category, RemoteError,
  draft::{Draft, DraftPage, DraftPatch, NewDraft},
  query::{DirectoryQuery, DirectoryStats, RemotePage, RemotePagination},
  record::DirectoryRecord,
  remote::{RemoteDirectory, RemoteDrafts},
};
use lode_store_sqlite::SqliteStore;
use serde_json::json;

pub async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

pub fn record(category: Category, id: &str) -> DirectoryRecord {
  let payload = match category {
    Category::National => json!({
      "_id": id,
      "contractNumber": format!("MPSA-{id}"),
      "contractor": "Benguet Corp",
      "province": "Benguet",
    }),
    Category::Local => json!({
      "_id": id,
      "permitNumber": format!("SSMP-{id}"),
      "permitHolder": "Itogon Small-Scale Miners",
      "province": "Benguet",
    }),
    Category::Hotspots => json!({
      "_id": id,
      "complaintNumber": format!("CMP-{id}"),
      "province": "Camarines Norte",
      "natureOfReportedIllegalAct": "Illegal Mining",
    }),
  };
  DirectoryRecord::from_parts(category, payload).expect("record")
}

pub fn records(category: Category, ids: std::ops::Range<usize>) -> Vec<DirectoryRecord> {
  ids.map(|i| record(category, &format!("{category}-{i}"))).collect()
}

/// Pagination metadata the way the real API reports it.
pub fn pagination(page: u32, total_records: u64, limit: u32) -> RemotePagination {
  let total_pages = u32::try_from(total_records.div_ceil(u64::from(limit))).unwrap();
  RemotePagination {
    current_page:  Some(page),
    total_pages:   Some(total_pages),
    total_records: Some(total_records),
    has_next:      Some(page < total_pages),
  }
}

// ─── Directory ───────────────────────────────────────────────────────────────

type PageScript = Box<dyn Fn(u32, u32) -> Result<RemotePage, RemoteError> + Send + Sync>;

/// A remote directory whose pages are produced by per-category scripts.
/// Unscripted categories answer with an empty page and metadata.
#[derive(Default)]
pub struct FakeDirectory {
  scripts:  HashMap<Category, PageScript>,
  stats:    Mutex<Option<DirectoryStats>>,
  requests: Mutex<Vec<(Category, u32)>>,
  offline:  AtomicBool,
}

impl FakeDirectory {
  pub fn new() -> Self { Self::default() }

  pub fn script(
    mut self,
    category: Category,
    f: impl Fn(u32, u32) -> Result<RemotePage, RemoteError> + Send + Sync + 'static,
  ) -> Self {
    self.scripts.insert(category, Box::new(f));
    self
  }

  /// Serve `all` in pages of the requested size, with full metadata.
  pub fn serving(self, category: Category, all: Vec<DirectoryRecord>) -> Self {
    self.script(category, move |page, limit| {
      let start = ((page - 1) * limit) as usize;
      let chunk = all.iter().skip(start).take(limit as usize).cloned().collect();
      Ok(RemotePage {
        records:    chunk,
        pagination: Some(pagination(page, all.len() as u64, limit)),
      })
    })
  }

  pub fn with_stats(self, stats: DirectoryStats) -> Self {
    *self.stats.lock().unwrap() = Some(stats);
    self
  }

  /// Make every call fail with a network error.
  pub fn set_offline(&self, offline: bool) { self.offline.store(offline, Ordering::SeqCst); }

  pub fn requests(&self, category: Category) -> Vec<u32> {
    self
      .requests
      .lock()
      .unwrap()
      .iter()
      .filter(|(c, _)| *c == category)
      .map(|(_, page)| *page)
      .collect()
  }

  pub fn total_requests(&self) -> usize { self.requests.lock().unwrap().len() }
}

impl RemoteDirectory for FakeDirectory {
  async fn fetch_page(
    &self,
    category: Category,
    query: &DirectoryQuery,
  ) -> Result<RemotePage, RemoteError> {
    self.requests.lock().unwrap().push((category, query.page));
    if self.offline.load(Ordering::SeqCst) {
      return Err(RemoteError::Network("unreachable".into()));
    }
    match self.scripts.get(&category) {
      Some(script) => script(query.page, query.limit),
      None => Ok(RemotePage {
        records:    vec![],
        pagination: Some(pagination(query.page, 0, query.limit)),
      }),
    }
  }

  async fn fetch_stats(&self) -> Result<DirectoryStats, RemoteError> {
    if self.offline.load(Ordering::SeqCst) {
      return Err(RemoteError::Network("unreachable".into()));
    }
    self
      .stats
      .lock()
      .unwrap()
      .ok_or_else(|| RemoteError::Status { status: 404, message: "no stats".into() })
  }
}

// ─── Drafts ──────────────────────────────────────────────────────────────────

/// A remote drafts service keeping its drafts in memory.
#[derive(Default)]
pub struct FakeDrafts {
  drafts:  Mutex<Vec<Draft>>,
  next_id: AtomicUsize,
  failing: AtomicBool,
  creates: AtomicUsize,
  updates: AtomicUsize,
  /// Milliseconds each create takes to answer.
  create_delay_ms: AtomicU64,
}

impl FakeDrafts {
  pub fn new() -> Self { Self::default() }

  /// Make every call fail with a server error.
  pub fn set_failing(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

  /// Hold every create for `delay` before it answers.
  pub fn set_create_delay(&self, delay: Duration) {
    let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    self.create_delay_ms.store(ms, Ordering::SeqCst);
  }

  pub fn creates(&self) -> usize { self.creates.load(Ordering::SeqCst) }

  pub fn updates(&self) -> usize { self.updates.load(Ordering::SeqCst) }

  pub fn stored(&self) -> Vec<Draft> { self.drafts.lock().unwrap().clone() }

  /// Seed a draft as if another device had created it.
  pub fn seed(&self, input: NewDraft) -> Draft {
    let mut draft = Draft::new_local(input, Utc::now());
    draft.id = self.fresh_id();
    let draft = draft.into_remote();
    self.drafts.lock().unwrap().push(draft.clone());
    draft
  }

  fn fresh_id(&self) -> String {
    format!("65f0{:04}", self.next_id.fetch_add(1, Ordering::SeqCst))
  }

  fn check(&self) -> Result<(), RemoteError> {
    if self.failing.load(Ordering::SeqCst) {
      return Err(RemoteError::Status { status: 500, message: "internal error".into() });
    }
    Ok(())
  }
}

impl RemoteDrafts for FakeDrafts {
  async fn create_draft(&self, input: &NewDraft) -> Result<Draft, RemoteError> {
    self.creates.fetch_add(1, Ordering::SeqCst);
    let delay = self.create_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
      tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    self.check()?;
    Ok(self.seed(input.clone()))
  }

  async fn update_draft(&self, id: &str, patch: &DraftPatch) -> Result<Draft, RemoteError> {
    self.updates.fetch_add(1, Ordering::SeqCst);
    self.check()?;
    let mut drafts = self.drafts.lock().unwrap();
    let draft = drafts
      .iter_mut()
      .find(|d| d.id == id)
      .ok_or_else(|| RemoteError::Status { status: 404, message: "not found".into() })?;
    draft.apply_patch(patch, Utc::now());
    Ok(draft.clone().into_remote())
  }

  async fn delete_draft(&self, id: &str) -> Result<(), RemoteError> {
    self.check()?;
    let mut drafts = self.drafts.lock().unwrap();
    let before = drafts.len();
    drafts.retain(|d| d.id != id);
    if drafts.len() == before {
      return Err(RemoteError::Status { status: 404, message: "not found".into() });
    }
    Ok(())
  }

  async fn list_drafts(
    &self,
    reporter_id: &str,
    page: u32,
    limit: u32,
  ) -> Result<DraftPage, RemoteError> {
    self.check()?;
    let mine: Vec<Draft> = self
      .drafts
      .lock()
      .unwrap()
      .iter()
      .filter(|d| d.reporter_id == reporter_id)
      .cloned()
      .collect();
    let total = mine.len() as u64;
    let drafts = mine
      .into_iter()
      .skip(((page - 1) * limit) as usize)
      .take(limit as usize)
      .collect();
    Ok(DraftPage { drafts, pagination: Some(pagination(page, total, limit)) })
  }
}

pub fn new_draft(reporter: &str, site: &str) -> NewDraft {
  NewDraft {
    report_type: "illegal_mining".into(),
    reporter_id: reporter.into(),
    form_data:   json!({ "site": site }),
    attachments: vec![],
  }
}

//! Query parameters and the normalised pagination shape shared by the remote
//! and local data sources.

use serde::{Deserialize, Serialize};

use crate::{
  Category,
  record::{DirectoryRecord, FilterField},
};

// ─── Query ───────────────────────────────────────────────────────────────────

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Equality filters. Field names follow the remote API; see [`FilterField`]
/// for the hotspot aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryFilters {
  pub province:       Option<String>,
  pub status:         Option<String>,
  pub classification: Option<String>,
  #[serde(rename = "type")]
  pub kind:           Option<String>,
}

impl DirectoryFilters {
  pub fn get(&self, field: FilterField) -> Option<&str> {
    let value = match field {
      FilterField::Province => &self.province,
      FilterField::Status => &self.status,
      FilterField::Classification => &self.classification,
      FilterField::Type => &self.kind,
    };
    value.as_deref()
  }

  /// Every filter that is set, paired with its field.
  pub fn active(&self) -> impl Iterator<Item = (FilterField, &str)> + '_ {
    FilterField::ALL
      .into_iter()
      .filter_map(|f| self.get(f).map(|v| (f, v)))
  }
}

/// Parameters for a paginated, filtered directory query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryQuery {
  /// Case-insensitive substring matched against the category's searchable
  /// fields.
  pub search:  Option<String>,
  #[serde(flatten)]
  pub filters: DirectoryFilters,
  /// 1-based page number.
  pub page:    u32,
  pub limit:   u32,
}

impl Default for DirectoryQuery {
  fn default() -> Self {
    Self {
      search:  None,
      filters: DirectoryFilters::default(),
      page:    1,
      limit:   DEFAULT_PAGE_SIZE,
    }
  }
}

impl DirectoryQuery {
  /// A bare page request, as issued by the sync engine.
  pub fn page(page: u32, limit: u32) -> Self {
    Self { page, limit, ..Self::default() }
  }

  /// Clamp `page` to at least 1 and `limit` into `1..=max_limit`, and treat
  /// blank search text or filters as absent.
  pub fn normalized(mut self, max_limit: u32) -> Self {
    fn blank_to_none(v: &mut Option<String>) {
      if v.as_deref().is_some_and(|s| s.trim().is_empty()) {
        *v = None;
      }
    }

    self.page = self.page.max(1);
    self.limit = self.limit.clamp(1, max_limit.max(1));
    blank_to_none(&mut self.search);
    blank_to_none(&mut self.filters.province);
    blank_to_none(&mut self.filters.status);
    blank_to_none(&mut self.filters.classification);
    blank_to_none(&mut self.filters.kind);
    self
  }

  /// Row offset of the first record on `page`.
  pub fn offset(&self) -> u64 {
    u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
  }
}

// ─── Pagination ──────────────────────────────────────────────────────────────

/// Pagination metadata as the remote API reports it. Any field may be absent;
/// the whole object may be absent too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePagination {
  pub current_page:  Option<u32>,
  pub total_pages:   Option<u32>,
  pub total_records: Option<u64>,
  pub has_next:      Option<bool>,
}

impl RemotePagination {
  /// Whether the server explicitly signals that more pages follow.
  pub fn signals_more(&self) -> bool {
    if self.has_next == Some(true) {
      return true;
    }
    matches!(
      (self.current_page, self.total_pages),
      (Some(current), Some(total)) if current < total
    )
  }
}

/// The normalised pagination returned to callers regardless of source.
///
/// `has_next` is always `current_page < total_pages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub current_page:  u32,
  pub total_pages:   u32,
  pub total_records: u64,
  pub limit:         u32,
  pub has_next:      bool,
}

impl Pagination {
  /// Pagination for a slice of a fully known result set.
  pub fn from_counts(page: u32, limit: u32, total_records: u64) -> Self {
    let limit = limit.max(1);
    let total_pages =
      u32::try_from(total_records.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);
    Self::build(page.max(1), total_pages, total_records, limit)
  }

  /// Normalise whatever the remote reported for a page of `returned` records.
  pub fn from_remote(
    remote: Option<&RemotePagination>,
    page: u32,
    limit: u32,
    returned: usize,
  ) -> Self {
    let limit = limit.max(1);
    let page = page.max(1);
    let returned = returned as u64;
    let full_page = returned >= u64::from(limit);

    let Some(remote) = remote else {
      let seen = records_before(page, limit).saturating_add(returned);
      let total_pages = if full_page { page.saturating_add(1) } else { page };
      return Self::build(page, total_pages, seen, limit);
    };

    let current = remote.current_page.unwrap_or(page).max(1);
    let total_pages = remote
      .total_pages
      .or_else(|| {
        remote.total_records.map(|t| {
          u32::try_from(t.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
        })
      })
      .unwrap_or(match remote.has_next {
        Some(true) => current.saturating_add(1),
        Some(false) => current,
        None if full_page => current.saturating_add(1),
        None => current,
      });
    let total_records = remote
      .total_records
      .unwrap_or_else(|| records_before(current, limit).saturating_add(returned));

    Self::build(current, total_pages, total_records, limit)
  }

  fn build(current_page: u32, total_pages: u32, total_records: u64, limit: u32) -> Self {
    Self {
      current_page,
      total_pages,
      total_records,
      limit,
      has_next: current_page < total_pages,
    }
  }
}

/// Records on the pages before `page` (1-based).
fn records_before(page: u32, limit: u32) -> u64 {
  u64::from(page.saturating_sub(1)).saturating_mul(u64::from(limit))
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// One page as fetched from the remote directory.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePage {
  pub records:    Vec<DirectoryRecord>,
  pub pagination: Option<RemotePagination>,
}

/// One page of a local or routed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPage {
  pub records:    Vec<DirectoryRecord>,
  pub pagination: Pagination,
}

/// Aggregate record counts published by `GET /directory/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryStats {
  #[serde(default)]
  pub national: u64,
  #[serde(default)]
  pub local:    u64,
  #[serde(default)]
  pub hotspots: u64,
}

impl DirectoryStats {
  pub fn count(&self, category: Category) -> u64 {
    match category {
      Category::National => self.national,
      Category::Local => self.local,
      Category::Hotspots => self.hotspots,
    }
  }
}

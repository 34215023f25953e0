//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond precision,
//! `Z` suffix) so that they sort lexicographically. Structured fields are
//! stored as compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use lode_core::{
  Category,
  draft::Draft,
  record::{DirectoryRecord, FilterField},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Booleans ────────────────────────────────────────────────────────────────

pub fn encode_bool(b: bool) -> i64 { i64::from(b) }

// ─── Search ──────────────────────────────────────────────────────────────────

/// Build a `LIKE` pattern for a case-insensitive substring match, escaping
/// the wildcard characters with `\`.
pub fn like_pattern(needle: &str) -> String {
  let escaped = needle
    .to_lowercase()
    .replace('\\', "\\\\")
    .replace('%', "\\%")
    .replace('_', "\\_");
  format!("%{escaped}%")
}

// ─── Directory records ───────────────────────────────────────────────────────

/// Column values for one `directory_records` insert.
pub struct EncodedRecord {
  pub record_id:      String,
  pub payload_json:   String,
  pub search_text:    String,
  pub province:       Option<String>,
  pub status:         Option<String>,
  pub classification: Option<String>,
  pub kind:           Option<String>,
}

impl EncodedRecord {
  pub fn encode(record: &DirectoryRecord) -> Result<Self> {
    let filter = |f| record.filter_value(f).map(str::to_owned);
    Ok(Self {
      record_id:      record.record_id().to_owned(),
      payload_json:   record.to_json()?.to_string(),
      search_text:    record.search_text(),
      province:       filter(FilterField::Province),
      status:         filter(FilterField::Status),
      classification: filter(FilterField::Classification),
      kind:           filter(FilterField::Type),
    })
  }
}

/// Raw payload read back from `directory_records`.
pub struct RawRecord {
  pub payload_json: String,
}

impl RawRecord {
  pub fn into_record(self, category: Category) -> Result<DirectoryRecord> {
    let payload: serde_json::Value = serde_json::from_str(&self.payload_json)?;
    Ok(DirectoryRecord::from_parts(category, payload)?)
  }
}

// ─── Drafts ──────────────────────────────────────────────────────────────────

/// Raw strings read directly from a `drafts` row.
pub struct RawDraft {
  pub draft_id:    String,
  pub reporter_id: String,
  pub report_type: String,
  pub form_data:   String,
  pub attachments: String,
  pub created_at:  String,
  pub updated_at:  String,
  pub synced_at:   Option<String>,
  pub needs_sync:  i64,
  pub is_synced:   i64,
  pub remote_id:   Option<String>,
}

/// The column list matching [`RawDraft::from_row`].
pub const DRAFT_COLUMNS: &str = "draft_id, reporter_id, report_type, form_data, \
                                 attachments, created_at, updated_at, synced_at, \
                                 needs_sync, is_synced, remote_id";

impl RawDraft {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      draft_id:    row.get(0)?,
      reporter_id: row.get(1)?,
      report_type: row.get(2)?,
      form_data:   row.get(3)?,
      attachments: row.get(4)?,
      created_at:  row.get(5)?,
      updated_at:  row.get(6)?,
      synced_at:   row.get(7)?,
      needs_sync:  row.get(8)?,
      is_synced:   row.get(9)?,
      remote_id:   row.get(10)?,
    })
  }

  pub fn encode(draft: &Draft) -> Result<Self> {
    Ok(Self {
      draft_id:    draft.id.clone(),
      reporter_id: draft.reporter_id.clone(),
      report_type: draft.report_type.clone(),
      form_data:   serde_json::to_string(&draft.form_data)?,
      attachments: serde_json::to_string(&draft.attachments)?,
      created_at:  encode_dt(draft.created_at),
      updated_at:  encode_dt(draft.updated_at),
      synced_at:   draft.synced_at.map(encode_dt),
      needs_sync:  encode_bool(draft.needs_sync),
      is_synced:   encode_bool(draft.is_synced),
      remote_id:   draft.remote_id.clone(),
    })
  }

  pub fn into_draft(self) -> Result<Draft> {
    Ok(Draft {
      id:          self.draft_id,
      reporter_id: self.reporter_id,
      report_type: self.report_type,
      form_data:   serde_json::from_str(&self.form_data)?,
      attachments: serde_json::from_str(&self.attachments)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
      synced_at:   self.synced_at.as_deref().map(decode_dt).transpose()?,
      needs_sync:  self.needs_sync != 0,
      is_synced:   self.is_synced != 0,
      remote_id:   self.remote_id,
    })
  }
}

//! [`SqliteStore`]: the SQLite implementation of [`LocalStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;

use lode_core::{
  Category,
  cache::{CategoryCache, DownloadStatus},
  draft::{Draft, DraftPatch},
  query::{DirectoryQuery, Pagination, QueryPage},
  record::DirectoryRecord,
  session::AuthSession,
  store::LocalStore,
};

use crate::{
  Result,
  encode::{
    DRAFT_COLUMNS, EncodedRecord, RawDraft, RawRecord, decode_dt, encode_dt,
    like_pattern,
  },
  schema::SCHEMA,
};

const DOWNLOAD_STATUS_KEY: &str = "download_status";
const SESSION_KEY: &str = "auth_session";

/// Shared filter clause for record queries. Parameters: `?1` category,
/// `?2` LIKE pattern, `?3`–`?6` province, status, classification, kind.
const RECORD_FILTER: &str = "WHERE category = ?1
     AND (?2 IS NULL OR search_text LIKE ?2 ESCAPE '\\')
     AND (?3 IS NULL OR province       = ?3 COLLATE NOCASE)
     AND (?4 IS NULL OR status         = ?4 COLLATE NOCASE)
     AND (?5 IS NULL OR classification = ?5 COLLATE NOCASE)
     AND (?6 IS NULL OR kind           = ?6 COLLATE NOCASE)";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lode local store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Write a batch of records and refresh the category's metadata in one
  /// transaction. `replace` drops the existing collection first and stamps
  /// the last-sync time; an append leaves the stamp alone.
  async fn write_records(
    &self,
    category: Category,
    records: Vec<DirectoryRecord>,
    replace: bool,
  ) -> Result<CategoryCache> {
    let encoded = records
      .iter()
      .map(EncodedRecord::encode)
      .collect::<Result<Vec<_>>>()?;
    let written = encoded.len();
    let key = category.as_str();
    let now_str = encode_dt(Utc::now());

    let (count, last_synced_at): (i64, Option<String>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if replace {
          tx.execute(
            "DELETE FROM directory_records WHERE category = ?1",
            rusqlite::params![key],
          )?;
        }

        {
          let mut stmt = tx.prepare(
            "INSERT INTO directory_records (
               category, record_id, payload_json, search_text,
               province, status, classification, kind, stored_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          )?;
          for r in &encoded {
            stmt.execute(rusqlite::params![
              key,
              r.record_id,
              r.payload_json,
              r.search_text,
              r.province,
              r.status,
              r.classification,
              r.kind,
              now_str,
            ])?;
          }
        }

        let count: i64 = tx.query_row(
          "SELECT COUNT(*) FROM directory_records WHERE category = ?1",
          rusqlite::params![key],
          |row| row.get(0),
        )?;
        let synced_stamp = replace.then_some(now_str);
        tx.execute(
          "INSERT INTO category_meta (category, record_count, last_synced_at)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (category) DO UPDATE SET
             record_count   = excluded.record_count,
             last_synced_at = COALESCE(excluded.last_synced_at, category_meta.last_synced_at)",
          rusqlite::params![key, count, synced_stamp],
        )?;
        let last_synced_at: Option<String> = tx.query_row(
          "SELECT last_synced_at FROM category_meta WHERE category = ?1",
          rusqlite::params![key],
          |row| row.get(0),
        )?;

        tx.commit()?;
        Ok((count, last_synced_at))
      })
      .await?;

    debug!(category = %category, written, total = count, replace, "stored directory records");

    Ok(CategoryCache {
      category,
      count: u64::try_from(count).unwrap_or_default(),
      last_synced_at: last_synced_at.as_deref().map(decode_dt).transpose()?,
    })
  }

  /// Read drafts matching a `WHERE` clause with one optional text parameter.
  async fn select_drafts(
    &self,
    clause: &'static str,
    param: Option<String>,
  ) -> Result<Vec<Draft>> {
    let raws: Vec<RawDraft> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {DRAFT_COLUMNS} FROM drafts {clause}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(param), RawDraft::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDraft::into_draft).collect()
  }

  /// Read a draft, change it, and write it back in one transaction, so a
  /// concurrent edit and sync confirmation cannot overwrite each other.
  async fn modify_draft<F>(&self, id: &str, modify: F) -> Result<Option<Draft>>
  where
    F: FnOnce(&mut Draft) + Send + 'static,
  {
    let id = id.to_owned();
    let draft = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raw = tx
          .query_row(
            &format!("SELECT {DRAFT_COLUMNS} FROM drafts WHERE draft_id = ?1"),
            rusqlite::params![id],
            RawDraft::from_row,
          )
          .optional()?;
        let Some(raw) = raw else {
          return Ok(None);
        };

        let mut draft = raw.into_draft().map_err(call_error)?;
        modify(&mut draft);
        write_draft(&tx, &RawDraft::encode(&draft).map_err(call_error)?)?;
        tx.commit()?;
        Ok(Some(draft))
      })
      .await?;
    Ok(draft)
  }

  async fn put_state(&self, key: &'static str, value_json: String) -> Result<()> {
    let at_str = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO app_state (key, value_json, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT (key) DO UPDATE SET
             value_json = excluded.value_json,
             updated_at = excluded.updated_at",
          rusqlite::params![key, value_json, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_state(&self, key: &'static str) -> Result<Option<String>> {
    let value = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value_json FROM app_state WHERE key = ?1",
              rusqlite::params![key],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(value)
  }

  async fn delete_state(&self, key: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM app_state WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn write_draft(conn: &rusqlite::Connection, raw: &RawDraft) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "INSERT OR REPLACE INTO drafts ({DRAFT_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
    ),
    rusqlite::params![
      raw.draft_id,
      raw.reporter_id,
      raw.report_type,
      raw.form_data,
      raw.attachments,
      raw.created_at,
      raw.updated_at,
      raw.synced_at,
      raw.needs_sync,
      raw.is_synced,
      raw.remote_id,
    ],
  )?;
  Ok(())
}

/// Carry a decode failure out of a `Connection::call` closure.
fn call_error(err: crate::Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(err))
}

// ─── LocalStore impl ─────────────────────────────────────────────────────────

impl LocalStore for SqliteStore {
  type Error = crate::Error;

  // ── Directory records ─────────────────────────────────────────────────────

  async fn replace_records(
    &self,
    category: Category,
    records: Vec<DirectoryRecord>,
  ) -> Result<CategoryCache> {
    self.write_records(category, records, true).await
  }

  async fn append_records(
    &self,
    category: Category,
    records: Vec<DirectoryRecord>,
  ) -> Result<CategoryCache> {
    self.write_records(category, records, false).await
  }

  async fn get_records(&self, category: Category) -> Result<Vec<DirectoryRecord>> {
    let key = category.as_str();

    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT payload_json FROM directory_records
           WHERE category = ?1 ORDER BY row_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![key], |row| {
            Ok(RawRecord { payload_json: row.get(0)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(|r| r.into_record(category)).collect()
  }

  async fn query(&self, category: Category, query: &DirectoryQuery) -> Result<QueryPage> {
    let key            = category.as_str();
    let pattern        = query.search.as_deref().map(like_pattern);
    let province       = query.filters.province.clone();
    let status         = query.filters.status.clone();
    let classification = query.filters.classification.clone();
    let kind           = query.filters.kind.clone();
    let page           = query.page.max(1);
    let limit          = query.limit.max(1);
    let offset         = i64::try_from(query.offset()).unwrap_or(i64::MAX);

    let (total, raws): (i64, Vec<RawRecord>) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM directory_records {RECORD_FILTER}"),
          rusqlite::params![
            key,
            pattern.as_deref(),
            province.as_deref(),
            status.as_deref(),
            classification.as_deref(),
            kind.as_deref(),
          ],
          |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
          "SELECT payload_json FROM directory_records {RECORD_FILTER}
           ORDER BY row_id LIMIT ?7 OFFSET ?8"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              key,
              pattern.as_deref(),
              province.as_deref(),
              status.as_deref(),
              classification.as_deref(),
              kind.as_deref(),
              limit,
              offset,
            ],
            |row| Ok(RawRecord { payload_json: row.get(0)? }),
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((total, rows))
      })
      .await?;

    let records = raws
      .into_iter()
      .map(|r| r.into_record(category))
      .collect::<Result<Vec<_>>>()?;
    let total = u64::try_from(total).unwrap_or_default();

    Ok(QueryPage { records, pagination: Pagination::from_counts(page, limit, total) })
  }

  async fn category_cache(&self, category: Category) -> Result<CategoryCache> {
    let key = category.as_str();

    let row: Option<(i64, Option<String>)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT record_count, last_synced_at FROM category_meta WHERE category = ?1",
              rusqlite::params![key],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    match row {
      Some((count, last_synced_at)) => Ok(CategoryCache {
        category,
        count: u64::try_from(count).unwrap_or_default(),
        last_synced_at: last_synced_at.as_deref().map(decode_dt).transpose()?,
      }),
      None => Ok(CategoryCache::empty(category)),
    }
  }

  async fn clear_category(&self, category: Category) -> Result<()> {
    let key = category.as_str();
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM directory_records WHERE category = ?1",
          rusqlite::params![key],
        )?;
        tx.execute("DELETE FROM category_meta WHERE category = ?1", rusqlite::params![key])?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    debug!(category = %category, "cleared category cache");
    Ok(())
  }

  /// Drops every directory record and the download status. Drafts and the
  /// session are kept.
  async fn clear_all(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM directory_records", [])?;
        tx.execute("DELETE FROM category_meta", [])?;
        tx.execute(
          "DELETE FROM app_state WHERE key = ?1",
          rusqlite::params![DOWNLOAD_STATUS_KEY],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    debug!("cleared all directory caches");
    Ok(())
  }

  // ── Download status ───────────────────────────────────────────────────────

  async fn save_download_status(&self, status: &DownloadStatus) -> Result<()> {
    let json = serde_json::to_string(status)?;
    self.put_state(DOWNLOAD_STATUS_KEY, json).await
  }

  async fn download_status(&self) -> Result<Option<DownloadStatus>> {
    self
      .get_state(DOWNLOAD_STATUS_KEY)
      .await?
      .map(|json| serde_json::from_str(&json))
      .transpose()
      .map_err(Into::into)
  }

  // ── Drafts ────────────────────────────────────────────────────────────────

  async fn save_draft(&self, draft: Draft) -> Result<Draft> {
    let raw = RawDraft::encode(&draft)?;

    self
      .conn
      .call(move |conn| {
        write_draft(conn, &raw)?;
        Ok(())
      })
      .await?;

    Ok(draft)
  }

  async fn get_draft(&self, id: &str) -> Result<Option<Draft>> {
    let mut drafts = self
      .select_drafts("WHERE draft_id = ?1", Some(id.to_owned()))
      .await?;
    Ok(drafts.pop())
  }

  async fn get_drafts(&self, reporter_id: &str) -> Result<Vec<Draft>> {
    self
      .select_drafts(
        "WHERE reporter_id = ?1 ORDER BY updated_at DESC",
        Some(reporter_id.to_owned()),
      )
      .await
  }

  async fn update_draft(&self, id: &str, patch: &DraftPatch) -> Result<Option<Draft>> {
    let patch = patch.clone();
    self
      .modify_draft(id, move |draft| draft.apply_patch(&patch, Utc::now()))
      .await
  }

  async fn delete_draft(&self, id: &str) -> Result<bool> {
    let id = id.to_owned();
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM drafts WHERE draft_id = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn delete_local_copies(&self, remote_id: &str) -> Result<u64> {
    let remote_id = remote_id.to_owned();
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM drafts WHERE remote_id = ?1",
          rusqlite::params![remote_id],
        )?)
      })
      .await?;
    Ok(deleted as u64)
  }

  async fn list_unsynced(&self) -> Result<Vec<Draft>> {
    self
      .select_drafts("WHERE needs_sync = 1 ORDER BY created_at ASC", None)
      .await
  }

  async fn mark_synced(
    &self,
    id: &str,
    remote_id: Option<String>,
    pushed_version: DateTime<Utc>,
  ) -> Result<Option<Draft>> {
    self
      .modify_draft(id, move |draft| {
        draft.mark_synced(remote_id, pushed_version, Utc::now());
      })
      .await
  }

  // ── Session ───────────────────────────────────────────────────────────────

  async fn save_session(&self, session: &AuthSession) -> Result<()> {
    let json = serde_json::to_string(session)?;
    self.put_state(SESSION_KEY, json).await
  }

  async fn load_session(&self) -> Result<Option<AuthSession>> {
    self
      .get_state(SESSION_KEY)
      .await?
      .map(|json| serde_json::from_str(&json))
      .transpose()
      .map_err(Into::into)
  }

  async fn clear_session(&self) -> Result<()> { self.delete_state(SESSION_KEY).await }
}

//! SQL schema for the Lode SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA synchronous = FULL;

-- Append-only log of downloaded directory records.
-- `row_id` is the only unique key: the remote `record_id` may repeat.
CREATE TABLE IF NOT EXISTS directory_records (
    row_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    category       TEXT NOT NULL,   -- 'national' | 'local' | 'hotspots'
    record_id      TEXT NOT NULL,   -- remote identifier, non-unique
    payload_json   TEXT NOT NULL,   -- record as received, without category tag
    search_text    TEXT NOT NULL,   -- lowercased searchable fields, 0x1F-separated
    province       TEXT,
    status         TEXT,            -- hotspots: actionsTaken
    classification TEXT,            -- hotspots: natureOfReportedIllegalAct
    kind           TEXT,            -- hotspots: typeOfCommodity
    stored_at      TEXT NOT NULL
);

-- One row per category; `record_count` is maintained in the same transaction
-- as every write to `directory_records`.
CREATE TABLE IF NOT EXISTS category_meta (
    category       TEXT PRIMARY KEY,
    record_count   INTEGER NOT NULL DEFAULT 0,
    last_synced_at TEXT
);

CREATE TABLE IF NOT EXISTS drafts (
    draft_id    TEXT PRIMARY KEY,   -- 'local_…' when created on this device
    reporter_id TEXT NOT NULL,
    report_type TEXT NOT NULL,
    form_data   TEXT NOT NULL,      -- JSON
    attachments TEXT NOT NULL DEFAULT '[]',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    synced_at   TEXT,
    needs_sync  INTEGER NOT NULL,
    is_synced   INTEGER NOT NULL,
    remote_id   TEXT
);

-- Singleton JSON documents: download status, auth session.
CREATE TABLE IF NOT EXISTS app_state (
    key        TEXT PRIMARY KEY,
    value_json TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS records_category_idx  ON directory_records(category, row_id);
CREATE INDEX IF NOT EXISTS records_remote_id_idx ON directory_records(category, record_id);
CREATE INDEX IF NOT EXISTS drafts_reporter_idx   ON drafts(reporter_id, updated_at);
CREATE INDEX IF NOT EXISTS drafts_unsynced_idx   ON drafts(needs_sync);

PRAGMA user_version = 1;
";

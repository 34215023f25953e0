//! Report drafts: user-authored incident reports pending submission.
//!
//! A draft created without connectivity gets a locally generated id carrying
//! [`LOCAL_ID_PREFIX`]; the prefix is how every layer tells a locally
//! originated draft from one the remote system already knows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::query::RemotePagination;

/// Provenance prefix for locally generated draft ids.
pub const LOCAL_ID_PREFIX: &str = "local_";

/// Whether `id` was generated on this device.
pub fn is_local_id(id: &str) -> bool { id.starts_with(LOCAL_ID_PREFIX) }

// ─── Provenance ──────────────────────────────────────────────────────────────

/// Which store a draft listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftOrigin {
  Local,
  Remote,
}

// ─── Draft ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
  #[serde(rename = "_id", alias = "id")]
  pub id:          String,
  pub report_type: String,
  #[serde(alias = "reporter")]
  pub reporter_id: String,
  /// Free-form form payload; opaque to this crate.
  #[serde(default)]
  pub form_data:   serde_json::Value,
  /// Attachment references (URIs or upload ids), never binary data.
  #[serde(default)]
  pub attachments: Vec<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
  #[serde(default)]
  pub synced_at:   Option<DateTime<Utc>>,
  /// True until the remote system has confirmed the current contents.
  #[serde(default)]
  pub needs_sync:  bool,
  #[serde(default)]
  pub is_synced:   bool,
  /// For a locally originated draft that has been pushed, the id the remote
  /// system assigned to it.
  #[serde(default)]
  pub remote_id:   Option<String>,
}

impl Draft {
  /// Build an unsynced draft with a fresh local id.
  pub fn new_local(input: NewDraft, now: DateTime<Utc>) -> Self {
    Self {
      id:          format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4()),
      report_type: input.report_type,
      reporter_id: input.reporter_id,
      form_data:   input.form_data,
      attachments: input.attachments,
      created_at:  now,
      updated_at:  now,
      synced_at:   None,
      needs_sync:  true,
      is_synced:   false,
      remote_id:   None,
    }
  }

  pub fn origin(&self) -> DraftOrigin {
    if is_local_id(&self.id) {
      DraftOrigin::Local
    } else {
      DraftOrigin::Remote
    }
  }

  /// Flag a draft freshly received from the remote system as confirmed.
  pub fn into_remote(mut self) -> Self {
    self.needs_sync = false;
    self.is_synced = true;
    self.synced_at.get_or_insert(self.updated_at);
    self
  }

  /// Apply a user edit. Bumps `updated_at` strictly past its previous value
  /// and marks the draft as needing sync.
  pub fn apply_patch(&mut self, patch: &DraftPatch, now: DateTime<Utc>) {
    if let Some(report_type) = &patch.report_type {
      self.report_type = report_type.clone();
    }
    if let Some(form_data) = &patch.form_data {
      self.form_data = form_data.clone();
    }
    if let Some(attachments) = &patch.attachments {
      self.attachments = attachments.clone();
    }
    self.updated_at = next_timestamp(self.updated_at, now);
    self.needs_sync = true;
    self.is_synced = false;
  }

  /// Record that the remote system has persisted the version of this draft
  /// last edited at `pushed_version`. The remote id is kept either way, but
  /// the draft only counts as synced if it has not been edited since.
  /// Returns whether it was confirmed.
  pub fn mark_synced(
    &mut self,
    remote_id: Option<String>,
    pushed_version: DateTime<Utc>,
    now: DateTime<Utc>,
  ) -> bool {
    if remote_id.is_some() {
      self.remote_id = remote_id;
    }
    if self.updated_at != pushed_version {
      return false;
    }
    self.needs_sync = false;
    self.is_synced = true;
    self.synced_at = Some(now);
    true
  }

  /// The creation payload for pushing this draft to the remote system.
  pub fn to_new_draft(&self) -> NewDraft {
    NewDraft {
      report_type: self.report_type.clone(),
      reporter_id: self.reporter_id.clone(),
      form_data:   self.form_data.clone(),
      attachments: self.attachments.clone(),
    }
  }

  /// A patch that overwrites every editable field with this draft's values.
  pub fn to_full_patch(&self) -> DraftPatch {
    DraftPatch {
      report_type: Some(self.report_type.clone()),
      form_data:   Some(self.form_data.clone()),
      attachments: Some(self.attachments.clone()),
    }
  }
}

/// `now` if it is later than `previous`, otherwise one millisecond past it.
/// Keeps `updated_at` strictly increasing even under coarse clocks.
pub fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
  if now > previous {
    now
  } else {
    previous + Duration::milliseconds(1)
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input for creating a draft; also the `POST /reports/drafts` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDraft {
  pub report_type: String,
  pub reporter_id: String,
  #[serde(default)]
  pub form_data:   serde_json::Value,
  #[serde(default)]
  pub attachments: Vec<String>,
}

/// A partial edit; also the `PUT /reports/drafts/{id}` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub report_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub form_data:   Option<serde_json::Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub attachments: Option<Vec<String>>,
}

// ─── Listings ────────────────────────────────────────────────────────────────

/// One page of drafts from `GET /reports/drafts`.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftPage {
  pub drafts:     Vec<Draft>,
  pub pagination: Option<RemotePagination>,
}

/// A draft annotated with the store it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftListing {
  #[serde(flatten)]
  pub draft:  Draft,
  pub origin: DraftOrigin,
}

//! Traits for the remote REST service and the error type they share.
//!
//! Implemented by `lode-client` over HTTP and by in-process fakes in tests.
//! Implementations perform no implicit retries; retrying is the caller's
//! decision.

use std::future::Future;

use thiserror::Error;

use crate::{
  Category,
  draft::{Draft, DraftPage, DraftPatch, NewDraft},
  query::{DirectoryQuery, DirectoryStats, RemotePage},
  session::{AuthSession, Credentials, Registration},
};

// ─── Error ───────────────────────────────────────────────────────────────────

/// Why a remote call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
  /// The request never produced a response (no route, DNS, timeout).
  #[error("network error: {0}")]
  Network(String),

  /// The server answered with a non-2xx status.
  #[error("remote returned {status}: {message}")]
  Status { status: u16, message: String },

  /// The body could not be decoded into the expected shape.
  #[error("malformed response: {0}")]
  Malformed(String),

  /// A 2xx response whose body reported `success: false`.
  #[error("remote rejected request: {0}")]
  Rejected(String),
}

impl RemoteError {
  /// Transport-level failures, as opposed to the server answering badly.
  pub fn is_network(&self) -> bool { matches!(self, Self::Network(_)) }
}

// ─── Directory ───────────────────────────────────────────────────────────────

pub trait RemoteDirectory: Send + Sync {
  /// `GET /directory/{category}` for one page.
  fn fetch_page<'a>(
    &'a self,
    category: Category,
    query: &'a DirectoryQuery,
  ) -> impl Future<Output = Result<RemotePage, RemoteError>> + Send + 'a;

  /// `GET /directory/stats`.
  fn fetch_stats(
    &self,
  ) -> impl Future<Output = Result<DirectoryStats, RemoteError>> + Send + '_;
}

// ─── Drafts ──────────────────────────────────────────────────────────────────

pub trait RemoteDrafts: Send + Sync {
  /// `POST /reports/drafts`; returns the draft with its remote id.
  fn create_draft<'a>(
    &'a self,
    draft: &'a NewDraft,
  ) -> impl Future<Output = Result<Draft, RemoteError>> + Send + 'a;

  /// `PUT /reports/drafts/{id}`.
  fn update_draft<'a>(
    &'a self,
    id: &'a str,
    patch: &'a DraftPatch,
  ) -> impl Future<Output = Result<Draft, RemoteError>> + Send + 'a;

  /// `DELETE /reports/drafts/{id}`.
  fn delete_draft<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), RemoteError>> + Send + 'a;

  /// `GET /reports/drafts?reporterId&page&limit`.
  fn list_drafts<'a>(
    &'a self,
    reporter_id: &'a str,
    page: u32,
    limit: u32,
  ) -> impl Future<Output = Result<DraftPage, RemoteError>> + Send + 'a;
}

// ─── Auth ────────────────────────────────────────────────────────────────────

pub trait RemoteAuth: Send + Sync {
  /// `POST /auth/login`.
  fn login<'a>(
    &'a self,
    credentials: &'a Credentials,
  ) -> impl Future<Output = Result<AuthSession, RemoteError>> + Send + 'a;

  /// `POST /auth/register`.
  fn register<'a>(
    &'a self,
    registration: &'a Registration,
  ) -> impl Future<Output = Result<AuthSession, RemoteError>> + Send + 'a;
}

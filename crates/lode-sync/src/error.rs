use lode_core::{Category, RemoteError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("network unavailable: {0}")]
  NetworkUnavailable(String),

  #[error("remote request failed: {0}")]
  RemoteRequestFailed(RemoteError),

  #[error("no offline data for {0} and no connection; go online and download the directory")]
  NoOfflineDataAvailable(Category),

  #[error("storage failure: {0}")]
  StorageFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("draft not found: {0}")]
  DraftNotFound(String),

  #[error("remote draft {0} cannot be deleted while offline")]
  OfflineDeleteUnsupported(String),

  #[error("not signed in")]
  NotAuthenticated,
}

impl From<RemoteError> for Error {
  fn from(err: RemoteError) -> Self {
    match err {
      RemoteError::Network(message) => Self::NetworkUnavailable(message),
      other => Self::RemoteRequestFailed(other),
    }
  }
}

impl Error {
  pub(crate) fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::StorageFailure(Box::new(err))
  }

  /// Map a remote failure for a specific draft, turning a 404 into
  /// [`Error::DraftNotFound`].
  pub(crate) fn for_draft(id: &str, err: RemoteError) -> Self {
    match err {
      RemoteError::Status { status: 404, .. } => Self::DraftNotFound(id.to_owned()),
      other => other.into(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

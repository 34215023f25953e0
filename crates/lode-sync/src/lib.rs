//! Offline-first orchestration for the Lode directory client.
//!
//! Everything here is generic over the `lode-core` traits: the local store,
//! the remote directory and drafts services, and a [`Connectivity`] source.
//! Nothing in this crate knows about HTTP or SQLite.

pub mod config;
pub mod connectivity;
pub mod drafts;
pub mod engine;
pub mod error;
pub mod router;
pub mod session;

#[cfg(test)]
mod testing;

pub use config::SyncConfig;
pub use connectivity::{Connectivity, ConnectivityMonitor, ConnectivityState};
pub use drafts::{DraftReconciler, DraftSyncState, SyncAllReport};
pub use engine::{CategorySyncReport, SyncEngine, SyncPhase, SyncProgress, SyncReport};
pub use error::{Error, Result};
pub use router::{DataSource, DirectoryResult, QueryRouter};
pub use session::SessionManager;

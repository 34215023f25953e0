//! Wiring: the store, the HTTP client and the connectivity flag shared by
//! every command.

use std::sync::Arc;

use anyhow::Context as _;
use lode_client::ApiClient;
use lode_core::store::LocalStore;
use lode_store_sqlite::SqliteStore;
use lode_sync::{
  ConnectivityMonitor, DraftReconciler, QueryRouter, SessionManager, SyncConfig, SyncEngine,
};
use tracing::debug;

use crate::config::CliConfig;

pub struct App {
  pub store:        Arc<SqliteStore>,
  pub client:       Arc<ApiClient>,
  pub connectivity: ConnectivityMonitor,
  pub sync:         SyncConfig,
}

impl App {
  /// Open the store and restore the persisted session's token, if any.
  pub async fn open(cfg: CliConfig, online: bool) -> anyhow::Result<Self> {
    if let Some(parent) = cfg.store_path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent)
        .await
        .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let store = SqliteStore::open(&cfg.store_path)
      .await
      .with_context(|| format!("failed to open store at {}", cfg.store_path.display()))?;

    let client = ApiClient::new(cfg.api).context("failed to build HTTP client")?;
    if let Some(session) = store.load_session().await.context("failed to load session")? {
      debug!(user = %session.user.id, "restoring session");
      client.set_token(Some(session.token));
    }

    Ok(Self {
      store:        Arc::new(store),
      client:       Arc::new(client),
      connectivity: ConnectivityMonitor::new(online),
      sync:         cfg.sync,
    })
  }

  pub fn engine(&self) -> SyncEngine<SqliteStore, ApiClient> {
    SyncEngine::new(self.store.clone(), self.client.clone(), self.sync.clone())
  }

  pub fn router(&self) -> QueryRouter<SqliteStore, ApiClient> {
    QueryRouter::new(
      self.store.clone(),
      self.client.clone(),
      Arc::new(self.connectivity.clone()),
      self.sync.clone(),
    )
  }

  pub fn drafts(&self) -> DraftReconciler<SqliteStore, ApiClient> {
    DraftReconciler::new(
      self.store.clone(),
      self.client.clone(),
      Arc::new(self.connectivity.clone()),
    )
  }

  pub fn sessions(&self) -> SessionManager<SqliteStore, ApiClient> {
    SessionManager::new(self.store.clone(), self.client.clone())
  }
}

//! The Query Router: answers directory queries from the local cache or the
//! remote directory depending on connectivity and what has been downloaded.
//!
//! | online | cache     | source                                   |
//! |--------|-----------|------------------------------------------|
//! | yes    | empty     | remote, its pagination normalised        |
//! | yes    | non-empty | local (or remote first, see config)      |
//! | no     | non-empty | local                                    |
//! | no     | empty     | [`Error::NoOfflineDataAvailable`]        |

use std::sync::Arc;

use lode_core::{
  Category,
  query::{DirectoryQuery, Pagination},
  record::DirectoryRecord,
  remote::RemoteDirectory,
  store::LocalStore,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{Connectivity, Error, Result, SyncConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
  Remote,
  Local,
}

/// One page of routed results. `pagination` has the same shape whichever
/// source answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryResult {
  pub data:       Vec<DirectoryRecord>,
  pub pagination: Pagination,
  pub source:     DataSource,
}

pub struct QueryRouter<S, R> {
  store:        Arc<S>,
  remote:       Arc<R>,
  connectivity: Arc<dyn Connectivity>,
  config:       SyncConfig,
}

impl<S, R> QueryRouter<S, R>
where
  S: LocalStore,
  R: RemoteDirectory,
{
  pub fn new(
    store: Arc<S>,
    remote: Arc<R>,
    connectivity: Arc<dyn Connectivity>,
    config: SyncConfig,
  ) -> Self {
    Self { store, remote, connectivity, config }
  }

  pub async fn get_data(
    &self,
    category: Category,
    query: DirectoryQuery,
  ) -> Result<DirectoryResult> {
    let query = self.normalize(query);
    let online = self.connectivity.is_online();
    let cache = self
      .store
      .category_cache(category)
      .await
      .map_err(Error::storage)?;

    debug!(category = %category, online, cached = cache.count, page = query.page, "routing query");

    match (online, cache.is_empty()) {
      (true, true) => self.query_remote(category, &query).await,
      (true, false) if !self.config.prefer_local_when_online => {
        match self.query_remote(category, &query).await {
          Ok(result) => Ok(result),
          Err(err) => {
            warn!(category = %category, error = %err, "remote query failed; answering from cache");
            self.query_local(category, &query).await
          }
        }
      }
      (_, false) => self.query_local(category, &query).await,
      (false, true) => Err(Error::NoOfflineDataAvailable(category)),
    }
  }

  fn normalize(&self, mut query: DirectoryQuery) -> DirectoryQuery {
    if query.limit == 0 {
      query.limit = self.config.default_page_size;
    }
    query.normalized(self.config.batch_size)
  }

  async fn query_remote(
    &self,
    category: Category,
    query: &DirectoryQuery,
  ) -> Result<DirectoryResult> {
    let page = self.remote.fetch_page(category, query).await?;
    let pagination = Pagination::from_remote(
      page.pagination.as_ref(),
      query.page,
      query.limit,
      page.records.len(),
    );
    Ok(DirectoryResult { data: page.records, pagination, source: DataSource::Remote })
  }

  async fn query_local(
    &self,
    category: Category,
    query: &DirectoryQuery,
  ) -> Result<DirectoryResult> {
    let page = self
      .store
      .query(category, query)
      .await
      .map_err(Error::storage)?;
    Ok(DirectoryResult {
      data:       page.records,
      pagination: page.pagination,
      source:     DataSource::Local,
    })
  }
}

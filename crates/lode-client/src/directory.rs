//! `GET /directory/*`.

use lode_core::{
  Category, RemoteError,
  query::{DirectoryQuery, DirectoryStats, RemotePage},
  record::DirectoryRecord,
  remote::RemoteDirectory,
};
use tracing::debug;

use crate::{ApiClient, wire};

/// Query-string pairs for a directory page request.
fn query_params(query: &DirectoryQuery) -> Vec<(&'static str, String)> {
  let mut params = vec![
    ("page", query.page.to_string()),
    ("limit", query.limit.to_string()),
  ];
  if let Some(search) = &query.search {
    params.push(("search", search.clone()));
  }
  params.extend(
    query
      .filters
      .active()
      .map(|(field, value)| (field.param(), value.to_owned())),
  );
  params
}

impl RemoteDirectory for ApiClient {
  /// `GET /directory/{category}?page&limit&search&province&status&classification&type`
  async fn fetch_page(
    &self,
    category: Category,
    query: &DirectoryQuery,
  ) -> Result<RemotePage, RemoteError> {
    let what = format!("GET /directory/{category}");
    let req = self
      .get(&format!("/directory/{category}"))
      .query(&query_params(query));
    let body = self.send_json(req, &what).await?;

    let records = wire::items(&body, &what)?
      .iter()
      .map(|item| {
        DirectoryRecord::from_parts(category, item.clone())
          .map_err(|e| RemoteError::Malformed(format!("{what}: {e}")))
      })
      .collect::<Result<Vec<_>, _>>()?;
    let pagination = wire::pagination(&body);

    debug!(
      category = %category,
      page = query.page,
      records = records.len(),
      has_pagination = pagination.is_some(),
      "fetched directory page"
    );
    Ok(RemotePage { records, pagination })
  }

  /// `GET /directory/stats`
  async fn fetch_stats(&self) -> Result<DirectoryStats, RemoteError> {
    let what = "GET /directory/stats";
    let body = self.send_json(self.get("/directory/stats"), what).await?;
    wire::decode(&body, what)
  }
}

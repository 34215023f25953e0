//! `/reports/drafts` endpoints.

use lode_core::{
  RemoteError,
  draft::{Draft, DraftPage, DraftPatch, NewDraft},
  remote::RemoteDrafts,
};

use crate::{ApiClient, wire};

impl RemoteDrafts for ApiClient {
  /// `POST /reports/drafts`
  async fn create_draft(&self, draft: &NewDraft) -> Result<Draft, RemoteError> {
    let what = "POST /reports/drafts";
    let body = self
      .send_json(self.post("/reports/drafts").json(draft), what)
      .await?;
    wire::decode::<Draft>(&body, what).map(Draft::into_remote)
  }

  /// `PUT /reports/drafts/{id}`
  async fn update_draft(&self, id: &str, patch: &DraftPatch) -> Result<Draft, RemoteError> {
    let what = format!("PUT /reports/drafts/{id}");
    let body = self
      .send_json(self.put(&format!("/reports/drafts/{id}")).json(patch), &what)
      .await?;
    wire::decode::<Draft>(&body, &what).map(Draft::into_remote)
  }

  /// `DELETE /reports/drafts/{id}`
  async fn delete_draft(&self, id: &str) -> Result<(), RemoteError> {
    let what = format!("DELETE /reports/drafts/{id}");
    self
      .send_json(self.delete(&format!("/reports/drafts/{id}")), &what)
      .await?;
    Ok(())
  }

  /// `GET /reports/drafts?reporterId&page&limit`
  async fn list_drafts(
    &self,
    reporter_id: &str,
    page: u32,
    limit: u32,
  ) -> Result<DraftPage, RemoteError> {
    let what = "GET /reports/drafts";
    let req = self.get("/reports/drafts").query(&[
      ("reporterId", reporter_id.to_owned()),
      ("page", page.to_string()),
      ("limit", limit.to_string()),
    ]);
    let body = self.send_json(req, what).await?;

    let drafts = wire::items(&body, what)?
      .iter()
      .map(|item| {
        serde_json::from_value::<Draft>(item.clone())
          .map(Draft::into_remote)
          .map_err(|e| RemoteError::Malformed(format!("{what}: {e}")))
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(DraftPage { drafts, pagination: wire::pagination(&body) })
  }
}

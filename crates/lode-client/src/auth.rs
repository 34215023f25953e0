//! `/auth/*` endpoints.

use chrono::Utc;
use lode_core::{
  RemoteError,
  remote::RemoteAuth,
  session::{AuthSession, Credentials, Registration, UserProfile},
};
use serde::Deserialize;

use crate::{ApiClient, wire};

/// `{ user, token }`, either bare or inside the `data` envelope.
#[derive(Deserialize)]
struct AuthResponse {
  user:  UserProfile,
  token: String,
}

impl ApiClient {
  async fn authenticate(
    &self,
    path: &str,
    body: &(impl serde::Serialize + Sync),
  ) -> Result<AuthSession, RemoteError> {
    let what = format!("POST {path}");
    let resp = self.send_json(self.post(path).json(body), &what).await?;
    let AuthResponse { user, token } = wire::decode(&resp, &what)?;

    self.set_token(Some(token.clone()));
    Ok(AuthSession { token, user, signed_in: Utc::now() })
  }
}

impl RemoteAuth for ApiClient {
  /// `POST /auth/login`; the returned token is attached to later requests.
  async fn login(&self, credentials: &Credentials) -> Result<AuthSession, RemoteError> {
    self.authenticate("/auth/login", credentials).await
  }

  /// `POST /auth/register`; signs the new user in.
  async fn register(&self, registration: &Registration) -> Result<AuthSession, RemoteError> {
    self.authenticate("/auth/register", registration).await
  }
}

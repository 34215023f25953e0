//! The signed-in session. The remote login response is the source of truth;
//! the client keeps exactly one persisted copy in the local store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  #[serde(rename = "_id", alias = "id")]
  pub id:    String,
  pub email: String,
  #[serde(default)]
  pub name:  Option<String>,
  #[serde(default)]
  pub role:  Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
  pub token:     String,
  pub user:      UserProfile,
  /// When this device obtained the session.
  pub signed_in: DateTime<Utc>,
}

impl AuthSession {
  /// The reporter identity attached to drafts.
  pub fn reporter_id(&self) -> &str { &self.user.id }
}

/// `POST /auth/login` body.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/register` body.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
  pub name:     String,
  pub email:    String,
  pub password: String,
}

//! Sign-in state. The remote login response is authoritative and is
//! persisted once, in the local store.

use std::sync::Arc;

use lode_core::{
  remote::RemoteAuth,
  session::{AuthSession, Credentials, Registration},
  store::LocalStore,
};
use tracing::info;

use crate::{Error, Result};

pub struct SessionManager<S, A> {
  store: Arc<S>,
  auth:  Arc<A>,
}

impl<S, A> SessionManager<S, A>
where
  S: LocalStore,
  A: RemoteAuth,
{
  pub fn new(store: Arc<S>, auth: Arc<A>) -> Self { Self { store, auth } }

  pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession> {
    let session = self.auth.login(credentials).await?;
    self.persist(session).await
  }

  pub async fn register(&self, registration: &Registration) -> Result<AuthSession> {
    let session = self.auth.register(registration).await?;
    self.persist(session).await
  }

  pub async fn logout(&self) -> Result<()> {
    self.store.clear_session().await.map_err(Error::storage)?;
    info!("signed out");
    Ok(())
  }

  /// The persisted session, if any.
  pub async fn current(&self) -> Result<Option<AuthSession>> {
    self.store.load_session().await.map_err(Error::storage)
  }

  /// The persisted session, or [`Error::NotAuthenticated`].
  pub async fn require(&self) -> Result<AuthSession> {
    self.current().await?.ok_or(Error::NotAuthenticated)
  }

  async fn persist(&self, session: AuthSession) -> Result<AuthSession> {
    self
      .store
      .save_session(&session)
      .await
      .map_err(Error::storage)?;
    info!(user = %session.user.id, "signed in");
    Ok(session)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use lode_core::{RemoteError, session::UserProfile};

  use super::*;
  use crate::testing::store;

  struct FakeAuth;

  impl RemoteAuth for FakeAuth {
    async fn login(&self, credentials: &Credentials) -> Result<AuthSession, RemoteError> {
      if credentials.password != "hunter2" {
        return Err(RemoteError::Status { status: 401, message: "invalid credentials".into() });
      }
      Ok(session_for(&credentials.email))
    }

    async fn register(&self, registration: &Registration) -> Result<AuthSession, RemoteError> {
      Ok(session_for(&registration.email))
    }
  }

  fn session_for(email: &str) -> AuthSession {
    AuthSession {
      token:     "jwt-123".into(),
      user:      UserProfile { id: "u1".into(), email: email.into(), name: None, role: None },
      signed_in: Utc::now(),
    }
  }

  fn credentials(password: &str) -> Credentials {
    Credentials { email: "inspector@example.gov".into(), password: password.into() }
  }

  #[tokio::test]
  async fn login_persists_and_logout_clears() {
    let sessions = SessionManager::new(Arc::new(store().await), Arc::new(FakeAuth));
    assert!(matches!(sessions.require().await, Err(Error::NotAuthenticated)));

    let session = sessions.login(&credentials("hunter2")).await.unwrap();
    assert_eq!(sessions.current().await.unwrap(), Some(session));

    sessions.logout().await.unwrap();
    assert!(sessions.current().await.unwrap().is_none());
  }

  #[tokio::test]
  async fn rejected_login_persists_nothing() {
    let sessions = SessionManager::new(Arc::new(store().await), Arc::new(FakeAuth));

    let err = sessions.login(&credentials("wrong")).await.unwrap_err();
    assert!(matches!(
      err,
      Error::RemoteRequestFailed(RemoteError::Status { status: 401, .. })
    ));
    assert!(sessions.current().await.unwrap().is_none());
  }

  #[tokio::test]
  async fn register_signs_in() {
    let sessions = SessionManager::new(Arc::new(store().await), Arc::new(FakeAuth));
    let session = sessions
      .register(&Registration {
        name:     "Field Inspector".into(),
        email:    "new@example.gov".into(),
        password: "hunter2".into(),
      })
      .await
      .unwrap();
    assert_eq!(sessions.require().await.unwrap().user.email, session.user.email);
  }
}

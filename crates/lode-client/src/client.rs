//! Async HTTP client wrapping the remote JSON API.

use std::{
  sync::{Arc, PoisonError, RwLock},
  time::Duration,
};

use lode_core::RemoteError;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::wire;

fn default_timeout_secs() -> u64 { 30 }

/// Connection settings for the remote API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL the endpoint paths are appended to, e.g.
  /// `https://permits.example.gov/api`.
  pub base_url:     String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Bearer token to start with; replaced by [`ApiClient::set_token`].
  #[serde(default)]
  pub token:        Option<String>,
}

impl ApiConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url:     base_url.into(),
      timeout_secs: default_timeout_secs(),
      token:        None,
    }
  }
}

/// Async HTTP client for the remote REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] and the token slot are
/// `Arc`-based, so a token set on one clone is seen by all of them.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
  token:    Arc<RwLock<Option<String>>>,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self, reqwest::Error> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_owned(),
      token: Arc::new(RwLock::new(config.token)),
    })
  }

  /// Attach (or drop) the bearer token sent with every request.
  pub fn set_token(&self, token: Option<String>) {
    *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
  }

  pub(crate) fn get(&self, path: &str) -> RequestBuilder {
    self.client.get(self.url(path))
  }

  pub(crate) fn post(&self, path: &str) -> RequestBuilder {
    self.client.post(self.url(path))
  }

  pub(crate) fn put(&self, path: &str) -> RequestBuilder {
    self.client.put(self.url(path))
  }

  pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
    self.client.delete(self.url(path))
  }

  fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    let token = self
      .token
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone();
    match token {
      Some(t) => req.bearer_auth(t),
      None => req,
    }
  }

  /// Send a request and return its JSON body, mapping transport failures,
  /// non-2xx statuses, undecodable bodies, and `success: false` envelopes onto
  /// [`RemoteError`].
  pub(crate) async fn send_json(
    &self,
    req: RequestBuilder,
    what: &str,
  ) -> Result<serde_json::Value, RemoteError> {
    debug!(request = what, "sending");
    let resp = self
      .auth(req)
      .send()
      .await
      .map_err(|e| RemoteError::Network(format!("{what}: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(RemoteError::Status {
        status:  status.as_u16(),
        message: wire::error_message(&body).unwrap_or_else(|| status.to_string()),
      });
    }

    let bytes = resp
      .bytes()
      .await
      .map_err(|e| RemoteError::Malformed(format!("{what}: {e}")))?;
    // 204 and other bodiless successes carry nothing to check.
    if bytes.iter().all(u8::is_ascii_whitespace) {
      return Ok(serde_json::Value::Null);
    }

    let body: serde_json::Value = serde_json::from_slice(&bytes)
      .map_err(|e| RemoteError::Malformed(format!("{what}: {e}")))?;
    wire::check_success(&body, what)?;
    Ok(body)
  }
}

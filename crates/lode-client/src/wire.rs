//! Response-envelope helpers.
//!
//! The API wraps payloads as `{ success, data, pagination }`; a few endpoints
//! return the payload at the top level instead. Both shapes are accepted.

use lode_core::{RemoteError, query::RemotePagination};
use serde::de::DeserializeOwned;

/// Reject a 2xx body that reports `success: false`.
pub fn check_success(body: &serde_json::Value, what: &str) -> Result<(), RemoteError> {
  if body.get("success").and_then(serde_json::Value::as_bool) == Some(false) {
    let message = error_text(body).unwrap_or_else(|| format!("{what} failed"));
    return Err(RemoteError::Rejected(message));
  }
  Ok(())
}

/// The `data` member if present, otherwise the whole body.
pub fn payload(body: &serde_json::Value) -> &serde_json::Value {
  body.get("data").unwrap_or(body)
}

/// Decode the payload into `T`.
pub fn decode<T: DeserializeOwned>(
  body: &serde_json::Value,
  what: &str,
) -> Result<T, RemoteError> {
  serde_json::from_value(payload(body).clone())
    .map_err(|e| RemoteError::Malformed(format!("{what}: {e}")))
}

/// The payload as an array of raw items.
pub fn items<'a>(
  body: &'a serde_json::Value,
  what: &str,
) -> Result<&'a Vec<serde_json::Value>, RemoteError> {
  payload(body)
    .as_array()
    .ok_or_else(|| RemoteError::Malformed(format!("{what}: data is not an array")))
}

/// Pagination metadata, if the server sent any. An unreadable object is
/// treated the same as a missing one.
pub fn pagination(body: &serde_json::Value) -> Option<RemotePagination> {
  body
    .get("pagination")
    .filter(|p| p.is_object())
    .and_then(|p| serde_json::from_value(p.clone()).ok())
}

/// Pull a human-readable message out of an error body, if it is JSON.
pub fn error_message(body: &str) -> Option<String> {
  serde_json::from_str::<serde_json::Value>(body)
    .ok()
    .and_then(|v| error_text(&v))
    .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_owned()))
}

fn error_text(body: &serde_json::Value) -> Option<String> {
  ["error", "message"]
    .iter()
    .find_map(|k| body.get(*k).and_then(serde_json::Value::as_str))
    .map(str::to_owned)
}

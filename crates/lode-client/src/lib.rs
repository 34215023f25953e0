//! HTTP client for the remote directory, report-draft, and auth endpoints.
//!
//! [`ApiClient`] implements the remote traits from `lode-core`. It performs
//! exactly one request per call; retry policy lives in the sync layer.

mod auth;
mod client;
mod directory;
mod drafts;
mod wire;

pub use client::{ApiClient, ApiConfig};

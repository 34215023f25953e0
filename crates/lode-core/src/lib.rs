//! Core types and trait definitions for the Lode mining-permit directory
//! client.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod cache;
pub mod category;
pub mod draft;
pub mod error;
pub mod query;
pub mod record;
pub mod remote;
pub mod session;
pub mod store;

pub use category::Category;
pub use error::{Error, Result};
pub use remote::RemoteError;

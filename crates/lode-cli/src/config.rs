//! Layered configuration: defaults, then an optional TOML file, then
//! `LODE_`-prefixed environment variables (`__` separates nested keys, e.g.
//! `LODE_API__BASE_URL`). Command-line flags are applied on top by the
//! caller.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use lode_client::ApiConfig;
use lode_sync::SyncConfig;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
const DEFAULT_STORE_PATH: &str = "~/.local/share/lode/lode.db";

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
  pub api:        ApiConfig,
  #[serde(default)]
  pub sync:       SyncConfig,
  pub store_path: PathBuf,
}

impl CliConfig {
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("api.base_url", DEFAULT_BASE_URL)?
      .set_default("store_path", DEFAULT_STORE_PATH)?
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix("LODE")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .with_context(|| format!("failed to read config from {}", file.display()))?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise configuration")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_falls_back_to_defaults() {
    let cfg = CliConfig::load(Path::new("does-not-exist.toml")).unwrap();
    assert_eq!(cfg.api.timeout_secs, 30);
    assert_eq!(cfg.sync.batch_size, SyncConfig::default().batch_size);
  }

  #[test]
  fn tilde_is_expanded_against_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/lode.db")),
      PathBuf::from(home).join("lode.db")
    );
    assert_eq!(expand_tilde(Path::new("/tmp/lode.db")), PathBuf::from("/tmp/lode.db"));
  }
}

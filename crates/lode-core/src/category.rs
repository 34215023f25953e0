//! Directory categories: the three kinds of record the remote directory
//! publishes.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result};

/// One of the three directory collections.
///
/// The lowercase name doubles as the remote path segment
/// (`/directory/{category}`) and the local collection key.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
  /// Nationally issued mining contracts and permits.
  National,
  /// Locally issued (provincial / small-scale) permits.
  Local,
  /// Reported illegal-mining hotspots.
  Hotspots,
}

impl Category {
  /// Every category, in download order.
  pub const ALL: [Category; 3] =
    [Category::National, Category::Local, Category::Hotspots];

  /// The collection key; must match the strum/serde names above.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::National => "national",
      Self::Local => "local",
      Self::Hotspots => "hotspots",
    }
  }

  /// Parse a collection key, mapping failures onto [`Error::UnknownCategory`].
  pub fn from_key(key: &str) -> Result<Self> {
    key
      .parse()
      .map_err(|_| Error::UnknownCategory(key.to_owned()))
  }
}

//! Directory record types: the rows published by the remote directory.
//!
//! Records are never mutated once stored. The remote identifier is carried as
//! an ordinary attribute: it is unique within a category at the source but not
//! guaranteed unique across paginated fetches, so nothing in this crate keys
//! storage on it.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Category, Result};

// ─── Identifier decoding ─────────────────────────────────────────────────────

/// Accept either a string or an integer remote id; always store it as text.
fn deserialize_remote_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum RawId {
    Text(String),
    Number(i64),
  }

  Ok(match RawId::deserialize(deserializer)? {
    RawId::Text(s) => s,
    RawId::Number(n) => n.to_string(),
  })
}

// ─── Category payloads ───────────────────────────────────────────────────────

/// A nationally issued mining contract or permit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalRecord {
  #[serde(rename = "_id", alias = "id", deserialize_with = "deserialize_remote_id")]
  pub record_id:       String,
  pub contract_number: Option<String>,
  pub contractor:      Option<String>,
  pub commodity:       Option<String>,
  pub province:        Option<String>,
  pub municipality:    Option<String>,
  pub barangay:        Option<String>,
  pub status:          Option<String>,
  pub classification:  Option<String>,
  #[serde(rename = "type")]
  pub permit_type:     Option<String>,
  pub date_approved:   Option<String>,
  pub expiration_date: Option<String>,
  pub google_map_link: Option<String>,
  /// Fields the client does not interpret, kept verbatim.
  #[serde(flatten)]
  pub extra:           serde_json::Map<String, serde_json::Value>,
}

/// A locally issued (provincial or small-scale) permit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalRecord {
  #[serde(rename = "_id", alias = "id", deserialize_with = "deserialize_remote_id")]
  pub record_id:       String,
  pub permit_number:   Option<String>,
  pub permit_holder:   Option<String>,
  pub commodity:       Option<String>,
  pub province:        Option<String>,
  pub municipality:    Option<String>,
  pub barangay:        Option<String>,
  pub status:          Option<String>,
  pub classification:  Option<String>,
  #[serde(rename = "type")]
  pub permit_type:     Option<String>,
  pub date_issued:     Option<String>,
  pub expiration_date: Option<String>,
  pub google_map_link: Option<String>,
  #[serde(flatten)]
  pub extra:           serde_json::Map<String, serde_json::Value>,
}

/// A reported illegal-mining hotspot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotRecord {
  #[serde(rename = "_id", alias = "id", deserialize_with = "deserialize_remote_id")]
  pub record_id:                      String,
  pub complaint_number:               Option<String>,
  pub subject:                        Option<String>,
  pub province:                       Option<String>,
  pub municipality:                   Option<String>,
  pub barangay:                       Option<String>,
  pub nature_of_reported_illegal_act: Option<String>,
  pub type_of_commodity:              Option<String>,
  pub actions_taken:                  Option<String>,
  pub date_of_complaint:              Option<String>,
  pub google_map_link:                Option<String>,
  #[serde(flatten)]
  pub extra:                          serde_json::Map<String, serde_json::Value>,
}

// ─── Filters ─────────────────────────────────────────────────────────────────

/// The equality filters a directory query supports.
///
/// Hotspots alias three of them onto differently named fields: `status` is
/// `actionsTaken`, `classification` is `natureOfReportedIllegalAct`, and
/// `type` is `typeOfCommodity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
  Province,
  Status,
  Classification,
  Type,
}

impl FilterField {
  pub const ALL: [FilterField; 4] = [
    FilterField::Province,
    FilterField::Status,
    FilterField::Classification,
    FilterField::Type,
  ];

  /// The query-string parameter name used by the remote API.
  pub fn param(&self) -> &'static str {
    match self {
      Self::Province => "province",
      Self::Status => "status",
      Self::Classification => "classification",
      Self::Type => "type",
    }
  }
}

// ─── DirectoryRecord ─────────────────────────────────────────────────────────

/// A directory record of any category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "data", rename_all = "lowercase")]
pub enum DirectoryRecord {
  National(NationalRecord),
  Local(LocalRecord),
  #[serde(rename = "hotspots")]
  Hotspot(HotspotRecord),
}

impl DirectoryRecord {
  pub fn category(&self) -> Category {
    match self {
      Self::National(_) => Category::National,
      Self::Local(_) => Category::Local,
      Self::Hotspot(_) => Category::Hotspots,
    }
  }

  /// The remote-assigned identifier. Not unique across fetches.
  pub fn record_id(&self) -> &str {
    match self {
      Self::National(r) => &r.record_id,
      Self::Local(r) => &r.record_id,
      Self::Hotspot(r) => &r.record_id,
    }
  }

  /// The value compared against `field` when filtering, after category
  /// aliasing.
  pub fn filter_value(&self, field: FilterField) -> Option<&str> {
    let value = match (self, field) {
      (Self::National(r), FilterField::Province) => &r.province,
      (Self::National(r), FilterField::Status) => &r.status,
      (Self::National(r), FilterField::Classification) => &r.classification,
      (Self::National(r), FilterField::Type) => &r.permit_type,
      (Self::Local(r), FilterField::Province) => &r.province,
      (Self::Local(r), FilterField::Status) => &r.status,
      (Self::Local(r), FilterField::Classification) => &r.classification,
      (Self::Local(r), FilterField::Type) => &r.permit_type,
      (Self::Hotspot(r), FilterField::Province) => &r.province,
      (Self::Hotspot(r), FilterField::Status) => &r.actions_taken,
      (Self::Hotspot(r), FilterField::Classification) => {
        &r.nature_of_reported_illegal_act
      }
      (Self::Hotspot(r), FilterField::Type) => &r.type_of_commodity,
    };
    value.as_deref()
  }

  /// The fixed set of fields free-text search runs over.
  pub fn searchable_fields(&self) -> Vec<&str> {
    let fields: Vec<&Option<String>> = match self {
      Self::National(r) => vec![
        &r.contract_number,
        &r.contractor,
        &r.commodity,
        &r.province,
        &r.municipality,
      ],
      Self::Local(r) => vec![
        &r.permit_number,
        &r.permit_holder,
        &r.commodity,
        &r.province,
        &r.municipality,
        &r.barangay,
      ],
      Self::Hotspot(r) => vec![
        &r.complaint_number,
        &r.subject,
        &r.province,
        &r.municipality,
        &r.barangay,
        &r.nature_of_reported_illegal_act,
        &r.type_of_commodity,
      ],
    };
    fields.into_iter().filter_map(|f| f.as_deref()).collect()
  }

  /// Lowercased searchable fields joined by a unit separator, so a substring
  /// match cannot straddle two fields.
  pub fn search_text(&self) -> String {
    self
      .searchable_fields()
      .into_iter()
      .map(str::to_lowercase)
      .collect::<Vec<_>>()
      .join("\u{1f}")
  }

  /// Case-insensitive substring match over [`Self::searchable_fields`].
  pub fn matches_search(&self, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    self
      .searchable_fields()
      .into_iter()
      .any(|f| f.to_lowercase().contains(&needle))
  }

  /// Serialise the inner payload (without the category tag) as it appears on
  /// the wire and in the `payload_json` column.
  pub fn to_json(&self) -> Result<serde_json::Value> {
    let full = serde_json::to_value(self)?;
    Ok(full.get("data").cloned().unwrap_or(serde_json::Value::Null))
  }

  /// Decode a wire or stored payload for a known category.
  pub fn from_parts(category: Category, data: serde_json::Value) -> Result<Self> {
    Ok(match category {
      Category::National => Self::National(serde_json::from_value(data)?),
      Category::Local => Self::Local(serde_json::from_value(data)?),
      Category::Hotspots => Self::Hotspot(serde_json::from_value(data)?),
    })
  }
}

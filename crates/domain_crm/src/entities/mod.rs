//! CRM record types
//!
//! Each entity is a plain record struct that decodes from the store's row
//! shape (`firstName_c`, `Id`, ...) and serializes to camelCase for API
//! consumers, plus a camelCase input struct used for create and update.

pub mod activity;
pub mod company;
pub mod contact;
pub mod deal;

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use core_kernel::RecordKey;

pub use activity::{Activity, ActivityInput, ActivityType, DEFAULT_UPCOMING_LIMIT};
pub use company::{Company, CompanyInput};
pub use contact::{Contact, ContactInput};
pub use deal::{Deal, DealInput, DealStage, StageSummary};

/// A foreign key as returned by the store
///
/// Lookup fields come back either as the bare id or as `{Id, Name}` with the
/// referenced record's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference<K> {
    Id(K),
    Lookup {
        #[serde(rename = "Id")]
        id: K,
        #[serde(rename = "Name", default)]
        name: Option<String>,
    },
}

impl<K: RecordKey> Reference<K> {
    /// Referenced record id
    pub fn id(&self) -> K {
        match self {
            Reference::Id(id) | Reference::Lookup { id, .. } => *id,
        }
    }

    /// Display name, when the store expanded the lookup
    pub fn name(&self) -> Option<&str> {
        match self {
            Reference::Id(_) => None,
            Reference::Lookup { name, .. } => name.as_deref(),
        }
    }
}

impl<K: RecordKey> From<K> for Reference<K> {
    fn from(id: K) -> Self {
        Reference::Id(id)
    }
}

impl<K: RecordKey> fmt::Display for Reference<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "{}", self.id()),
        }
    }
}

/// Reads `null` as the type's default (empty string, zero, false)
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a calendar date stored either as `YYYY-MM-DD` or as a full timestamp
pub(crate) fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc).date_naive()))
        .map(Some)
        .map_err(serde::de::Error::custom)
}

/// Reads an instant, treating empty strings as absent
pub(crate) fn lenient_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    core_kernel::parse_timestamp(raw)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::CompanyId;
    use serde_json::json;

    #[test]
    fn test_reference_decodes_both_shapes() {
        let bare: Reference<CompanyId> = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(bare.id(), CompanyId::from_raw(7));
        assert_eq!(bare.name(), None);

        let lookup: Reference<CompanyId> =
            serde_json::from_value(json!({"Id": 7, "Name": "Acme"})).unwrap();
        assert_eq!(lookup.id(), CompanyId::from_raw(7));
        assert_eq!(lookup.name(), Some("Acme"));
        assert_eq!(lookup.to_string(), "Acme");
    }
}

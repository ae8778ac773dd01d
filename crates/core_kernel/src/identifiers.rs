//! Strongly-typed identifiers for CRM records
//!
//! The hosted record store assigns positive integer primary keys. Newtype
//! wrappers keep a contact id from being passed where a deal id is expected,
//! while still serializing as the bare integer the store speaks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Common behaviour of every record identifier
///
/// The generic record access layer only needs to move between the typed
/// identifier and the raw integer sent over the wire.
pub trait RecordKey:
    Copy + Eq + std::hash::Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Wraps a raw store key
    fn from_raw(value: i64) -> Self;

    /// Returns the raw store key
    fn raw(&self) -> i64;
}

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier, rejecting non-positive keys
            pub fn new(value: i64) -> Result<Self, CoreError> {
                if value <= 0 {
                    return Err(CoreError::invalid_identifier(format!(
                        "{} must be positive, got {}",
                        stringify!($name),
                        value
                    )));
                }
                Ok(Self(value))
            }

            /// Returns the underlying integer
            pub fn value(&self) -> i64 {
                self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl RecordKey for $name {
            fn from_raw(value: i64) -> Self {
                Self(value)
            }

            fn raw(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let digits = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                let value = digits
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| CoreError::invalid_identifier(format!("{}: {}", s, e)))?;
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(ContactId, "CNT");
define_id!(CompanyId, "CMP");
define_id!(DealId, "DEAL");
define_id!(ActivityId, "ACT");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_id_display() {
        let id = ContactId::new(42).unwrap();
        assert_eq!(id.to_string(), "CNT-42");
    }

    #[test]
    fn test_id_parsing_with_and_without_prefix() {
        let with_prefix: DealId = "DEAL-7".parse().unwrap();
        let bare: DealId = "7".parse().unwrap();
        assert_eq!(with_prefix, bare);
        assert_eq!(bare.value(), 7);
    }

    #[test]
    fn test_non_positive_rejected() {
        assert!(CompanyId::new(0).is_err());
        assert!(CompanyId::new(-3).is_err());
        assert!("ACT-0".parse::<ActivityId>().is_err());
    }

    #[test]
    fn test_serializes_as_bare_integer() {
        let id = ActivityId::new(9).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "9");
        let back: ActivityId = serde_json::from_str("9").unwrap();
        assert_eq!(back, id);
    }
}

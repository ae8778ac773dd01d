//! Entity schema descriptors and payload coercion
//!
//! The four CRM entities differ only in table name, field list, and a few
//! coercion rules. An [`EntitySchema`] captures exactly that, and the
//! functions here turn loosely-typed caller input (form values, JSON maps,
//! typed input structs) into the payload the store expects:
//!
//! - integers and decimals are accepted as numbers or numeric strings
//! - empty strings and zero foreign keys become null
//! - optional fields missing on create are sent as null (or their default)
//! - enumerated fields must hold one of their declared labels
//! - `createdAt` is stamped on create only, `updatedAt` on every write
//!   for entities that carry it
//!
//! Input keys may be either the store name (`firstName_c`) or the logical
//! name (`firstName`); keys that match no declared field are ignored.

use std::fmt::Debug;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Number, Value};

use core_kernel::{format_timestamp, RecordKey};

use crate::error::CrmError;
use crate::wire::{RawRecord, ID_FIELD};

/// Creation timestamp field
pub const CREATED_AT: &str = "createdAt_c";
/// Modification timestamp field
pub const UPDATED_AT: &str = "updatedAt_c";

/// Scalar kind of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    /// Integer constrained to an inclusive range
    BoundedInteger { min: i64, max: i64 },
    /// Foreign key to another entity; zero and empty mean "no link"
    Reference,
    Decimal,
    Boolean,
    /// Calendar date, sent as `YYYY-MM-DD`
    Date,
    /// Instant, sent as RFC 3339 with millisecond precision
    Timestamp,
    /// One of a closed set of labels
    Choice(&'static [&'static str]),
}

/// Value sent for an optional field the caller left out on create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Null,
    Zero,
    False,
}

impl FieldDefault {
    fn value(&self) -> Value {
        match self {
            FieldDefault::Null => Value::Null,
            FieldDefault::Zero => Value::from(0),
            FieldDefault::False => Value::Bool(false),
        }
    }
}

/// Declaration of one writable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: FieldDefault,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: FieldDefault::Null,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            default: FieldDefault::Null,
        }
    }

    pub const fn or_default(self, default: FieldDefault) -> Self {
        Self { default, ..self }
    }

    /// Field name without the store's custom-field suffix (`firstName_c` -> `firstName`)
    pub fn logical_name(&self) -> &'static str {
        self.name.strip_suffix("_c").unwrap_or(self.name)
    }

    /// Value supplied for this field, keyed by store or logical name
    pub fn supplied<'a>(&self, input: &'a RawRecord) -> Option<&'a Value> {
        input.get(self.name).or_else(|| input.get(self.logical_name()))
    }
}

/// Which audit timestamps an entity carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPolicy {
    CreatedOnly,
    CreatedAndUpdated,
}

impl TimestampPolicy {
    pub fn tracks_updates(&self) -> bool {
        matches!(self, TimestampPolicy::CreatedAndUpdated)
    }
}

/// Static description of one entity table
///
/// Implemented by each record type; drives the generic
/// [`EntityRepository`](crate::repository::EntityRepository).
pub trait EntitySchema:
    DeserializeOwned + Serialize + Clone + Debug + Send + Sync + 'static
{
    /// Typed primary key
    type Id: RecordKey;

    /// Display name used in errors and logs
    const ENTITY: &'static str;
    /// Store table name
    const TABLE: &'static str;
    /// Writable fields, in projection order
    const FIELDS: &'static [FieldSpec];
    /// Audit timestamps carried by the table
    const TIMESTAMPS: TimestampPolicy;
    /// Text fields matched by substring search
    const SEARCH_FIELDS: &'static [&'static str] = &[];

    /// Primary key of this record
    fn id(&self) -> Self::Id;

    /// Fields requested on every read
    fn projection() -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = Self::FIELDS.iter().map(|f| f.name).collect();
        fields.push(CREATED_AT);
        if Self::TIMESTAMPS.tracks_updates() {
            fields.push(UPDATED_AT);
        }
        fields
    }

    /// Looks up a declared field
    fn field(name: &str) -> Option<&'static FieldSpec> {
        Self::FIELDS.iter().find(|f| f.name == name)
    }
}

/// Renames declared fields keyed by store name (`email_c`) to their logical
/// name (`email`); the store name wins when both are present
pub fn logical_keys<S: EntitySchema>(input: &RawRecord) -> RawRecord {
    let mut normalized = input.clone();
    for spec in S::FIELDS {
        if let Some(value) = normalized.remove(spec.name) {
            normalized.insert(spec.logical_name().to_string(), value);
        }
    }
    normalized
}

/// Converts any serializable input into a field map
pub fn to_raw_input<I: Serialize + ?Sized>(input: &I) -> Result<RawRecord, CrmError> {
    match serde_json::to_value(input) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CrmError::validation(format!(
            "record input must be an object, got {}",
            type_name(&other)
        ))),
        Err(e) => Err(CrmError::validation(format!("record input is not serializable: {}", e))),
    }
}

/// Builds the single-record insert payload for `S`
pub fn build_create_record<S: EntitySchema>(
    input: &RawRecord,
    now: DateTime<Utc>,
) -> Result<RawRecord, CrmError> {
    let mut record = RawRecord::new();
    for spec in S::FIELDS {
        let supplied = spec.supplied(input).filter(|v| !v.is_null());
        let value = match supplied {
            Some(raw) => coerce_value(spec, raw)?,
            None => Value::Null,
        };
        let value = if value.is_null() {
            if spec.required {
                return Err(CrmError::invalid_field(
                    spec.name,
                    format!("{} is required", spec.name),
                ));
            }
            spec.default.value()
        } else {
            value
        };
        record.insert(spec.name.to_string(), value);
    }

    let stamp = Value::String(format_timestamp(now));
    record.insert(CREATED_AT.to_string(), stamp.clone());
    if S::TIMESTAMPS.tracks_updates() {
        record.insert(UPDATED_AT.to_string(), stamp);
    }
    Ok(record)
}

/// Builds one update record for `S`: `Id`, the supplied fields, and `updatedAt`
///
/// Fields the caller left out are not sent, so the store keeps their
/// current values. `createdAt` is never resent.
pub fn build_update_record<S: EntitySchema>(
    id: i64,
    input: &RawRecord,
    now: DateTime<Utc>,
) -> Result<RawRecord, CrmError> {
    let mut record = RawRecord::new();
    record.insert(ID_FIELD.to_string(), Value::from(id));

    for spec in S::FIELDS {
        let Some(raw) = spec.supplied(input) else {
            continue;
        };
        let value = coerce_value(spec, raw)?;
        if value.is_null() && spec.required {
            return Err(CrmError::invalid_field(
                spec.name,
                format!("{} cannot be cleared", spec.name),
            ));
        }
        record.insert(spec.name.to_string(), value);
    }

    if S::TIMESTAMPS.tracks_updates() {
        record.insert(UPDATED_AT.to_string(), Value::String(format_timestamp(now)));
    }
    Ok(record)
}

/// Coerces one supplied value according to its declared kind
pub fn coerce_value(spec: &FieldSpec, raw: &Value) -> Result<Value, CrmError> {
    if raw.is_null() {
        return Ok(Value::Null);
    }

    match spec.kind {
        FieldKind::Text => match raw {
            Value::String(s) if s.is_empty() && !spec.required => Ok(Value::Null),
            Value::String(_) => Ok(raw.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(mismatch(spec, "text", other)),
        },
        FieldKind::Integer => match parse_integer(spec, raw)? {
            Some(n) => Ok(Value::from(n)),
            None => Ok(Value::Null),
        },
        FieldKind::BoundedInteger { min, max } => match parse_integer(spec, raw)? {
            Some(n) if n < min || n > max => Err(CrmError::invalid_field(
                spec.name,
                format!("{} must be between {} and {}, got {}", spec.name, min, max, n),
            )),
            Some(n) => Ok(Value::from(n)),
            None => Ok(Value::Null),
        },
        FieldKind::Reference => {
            let raw = match raw {
                // Lookup objects as returned by the store
                Value::Object(map) => map.get(ID_FIELD).unwrap_or(&Value::Null),
                other => other,
            };
            match parse_integer(spec, raw)? {
                Some(n) if n > 0 => Ok(Value::from(n)),
                Some(n) if n < 0 => Err(CrmError::invalid_field(
                    spec.name,
                    format!("{} must be a positive id, got {}", spec.name, n),
                )),
                _ => Ok(Value::Null),
            }
        }
        FieldKind::Decimal => {
            let parsed = match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) if s.trim().is_empty() => return Ok(Value::Null),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            parsed
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| mismatch(spec, "decimal number", raw))
        }
        FieldKind::Boolean => match raw {
            Value::Bool(_) => Ok(raw.clone()),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                "" => Ok(Value::Null),
                _ => Err(mismatch(spec, "boolean", raw)),
            },
            Value::Number(n) => Ok(Value::Bool(n.as_f64().map(|f| f != 0.0).unwrap_or(false))),
            other => Err(mismatch(spec, "boolean", other)),
        },
        FieldKind::Date => match raw {
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => parse_date(s.trim())
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .ok_or_else(|| mismatch(spec, "date (YYYY-MM-DD)", raw)),
            other => Err(mismatch(spec, "date (YYYY-MM-DD)", other)),
        },
        FieldKind::Timestamp => match raw {
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => parse_instant(s.trim())
                .map(|dt| Value::String(format_timestamp(dt)))
                .ok_or_else(|| mismatch(spec, "RFC 3339 timestamp", raw)),
            other => Err(mismatch(spec, "RFC 3339 timestamp", other)),
        },
        FieldKind::Choice(labels) => match raw {
            Value::String(s) if s.is_empty() && !spec.required => Ok(Value::Null),
            Value::String(s) if labels.contains(&s.as_str()) => Ok(raw.clone()),
            other => Err(CrmError::invalid_field(
                spec.name,
                format!(
                    "invalid value {} for {}; expected one of: {}",
                    other,
                    spec.name,
                    labels.join(", ")
                ),
            )),
        },
    }
}

fn parse_integer(spec: &FieldSpec, raw: &Value) -> Result<Option<i64>, CrmError> {
    match raw {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Some(i)),
            // Fractional input is truncated toward zero
            None => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map(|f| Some(f.trunc() as i64))
                .ok_or_else(|| mismatch(spec, "integer", raw)),
        },
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Some(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| Some(f.trunc() as i64))
                .ok_or_else(|| mismatch(spec, "integer", raw))
        }
        other => Err(mismatch(spec, "integer", other)),
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_instant(value).map(|dt| dt.date_naive()))
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            // Bare dates are read as midnight UTC
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

fn mismatch(spec: &FieldSpec, expected: &str, got: &Value) -> CrmError {
    CrmError::invalid_field(
        spec.name,
        format!("{} expects {}, got {}", spec.name, expected, got),
    )
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Companies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::CompanyId;

use super::{lenient_instant, null_as_default};
use crate::schema::{EntitySchema, FieldKind, FieldSpec, TimestampPolicy};

/// An organisation contacts belong to and deals are won from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(rename(serialize = "id", deserialize = "Id"))]
    pub id: CompanyId,
    #[serde(
        rename(serialize = "name", deserialize = "name_c"),
        default,
        deserialize_with = "null_as_default"
    )]
    pub name: String,
    #[serde(
        rename(serialize = "industry", deserialize = "industry_c"),
        default,
        deserialize_with = "null_as_default"
    )]
    pub industry: String,
    #[serde(
        rename(serialize = "size", deserialize = "size_c"),
        default,
        deserialize_with = "null_as_default"
    )]
    pub size: String,
    #[serde(rename(serialize = "website", deserialize = "website_c"), default)]
    pub website: Option<String>,
    #[serde(rename(serialize = "address", deserialize = "address_c"), default)]
    pub address: Option<String>,
    #[serde(rename(serialize = "notes", deserialize = "notes_c"), default)]
    pub notes: Option<String>,
    #[serde(
        rename(serialize = "createdAt", deserialize = "createdAt_c"),
        default,
        deserialize_with = "lenient_instant"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl EntitySchema for Company {
    type Id = CompanyId;

    const ENTITY: &'static str = "Company";
    const TABLE: &'static str = "company_c";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("name_c", FieldKind::Text),
        FieldSpec::required("industry_c", FieldKind::Text),
        FieldSpec::required("size_c", FieldKind::Text),
        FieldSpec::optional("website_c", FieldKind::Text),
        FieldSpec::optional("address_c", FieldKind::Text),
        FieldSpec::optional("notes_c", FieldKind::Text),
    ];
    const TIMESTAMPS: TimestampPolicy = TimestampPolicy::CreatedOnly;
    const SEARCH_FIELDS: &'static [&'static str] = &["name_c", "industry_c", "size_c"];

    fn id(&self) -> CompanyId {
        self.id
    }
}

/// Fields for creating or patching a company; `None` fields are not sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

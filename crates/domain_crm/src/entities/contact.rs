//! Contacts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use core_kernel::{format_timestamp, CompanyId, ContactId};

use super::{null_as_default, Reference};
use crate::error::CrmError;
use crate::export::{ExportColumn, TextExport};
use crate::repository::EntityRepository;
use crate::schema::{EntitySchema, FieldKind, FieldSpec, TimestampPolicy};

/// A person the sales team is in touch with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename(serialize = "id", deserialize = "Id"))]
    pub id: ContactId,
    #[serde(
        rename(serialize = "firstName", deserialize = "firstName_c"),
        default,
        deserialize_with = "null_as_default"
    )]
    pub first_name: String,
    #[serde(
        rename(serialize = "lastName", deserialize = "lastName_c"),
        default,
        deserialize_with = "null_as_default"
    )]
    pub last_name: String,
    #[serde(
        rename(serialize = "email", deserialize = "email_c"),
        default,
        deserialize_with = "null_as_default"
    )]
    pub email: String,
    #[serde(rename(serialize = "phone", deserialize = "phone_c"), default)]
    pub phone: Option<String>,
    #[serde(rename(serialize = "companyId", deserialize = "companyId_c"), default)]
    pub company_id: Option<Reference<CompanyId>>,
    #[serde(rename(serialize = "title", deserialize = "title_c"), default)]
    pub title: Option<String>,
    #[serde(rename(serialize = "notes", deserialize = "notes_c"), default)]
    pub notes: Option<String>,
    #[serde(
        rename(serialize = "createdAt", deserialize = "createdAt_c"),
        default,
        deserialize_with = "super::lenient_instant"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        rename(serialize = "updatedAt", deserialize = "updatedAt_c"),
        default,
        deserialize_with = "super::lenient_instant"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contact {
    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

impl EntitySchema for Contact {
    type Id = ContactId;

    const ENTITY: &'static str = "Contact";
    const TABLE: &'static str = "contact_c";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("firstName_c", FieldKind::Text),
        FieldSpec::required("lastName_c", FieldKind::Text),
        FieldSpec::required("email_c", FieldKind::Text),
        FieldSpec::optional("phone_c", FieldKind::Text),
        FieldSpec::optional("companyId_c", FieldKind::Reference),
        FieldSpec::optional("title_c", FieldKind::Text),
        FieldSpec::optional("notes_c", FieldKind::Text),
    ];
    const TIMESTAMPS: TimestampPolicy = TimestampPolicy::CreatedAndUpdated;
    const SEARCH_FIELDS: &'static [&'static str] =
        &["firstName_c", "lastName_c", "email_c", "title_c"];

    fn id(&self) -> ContactId {
        self.id
    }
}

/// Fields for creating or patching a contact; `None` fields are not sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

const EXPORT_COLUMNS: &[ExportColumn<Contact>] = &[
    ExportColumn::bare("ID", |c| c.id.value().to_string()),
    ExportColumn::new("First Name", |c| c.first_name.clone()),
    ExportColumn::new("Last Name", |c| c.last_name.clone()),
    ExportColumn::new("Email", |c| c.email.clone()),
    ExportColumn::new("Phone", |c| c.phone.clone().unwrap_or_default()),
    ExportColumn::new("Title", |c| c.title.clone().unwrap_or_default()),
    ExportColumn::new("Company", |c| {
        c.company_id
            .as_ref()
            .and_then(|r| r.name())
            .map(str::to_string)
            .unwrap_or_default()
    }),
    ExportColumn::new("Created At", |c| export_instant(c.created_at)),
    ExportColumn::new("Updated At", |c| export_instant(c.updated_at)),
];

fn export_instant(instant: Option<DateTime<Utc>>) -> String {
    instant.map(format_timestamp).unwrap_or_default()
}

impl EntityRepository<Contact> {
    /// Contacts linked to a company
    pub async fn by_company(&self, company_id: CompanyId) -> Vec<Contact> {
        self.find_by_reference("companyId_c", company_id).await
    }

    /// Renders contacts as a CSV document named after today's date
    #[instrument(skip(self, contacts), fields(count = contacts.len()))]
    pub fn export_csv(&self, contacts: &[Contact]) -> Result<TextExport, CrmError> {
        let filename = format!("contacts_export_{}.csv", self.now().format("%Y-%m-%d"));
        TextExport::csv(filename, EXPORT_COLUMNS, contacts)
    }
}
